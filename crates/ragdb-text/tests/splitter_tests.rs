use ragdb_core::traits::Splitter;
use ragdb_core::{Chunk, Error, MemChunk};
use ragdb_text::{TextSplitter, Window};
use serde_json::json;

fn tagged_text() -> String {
    let a = "a".repeat(37);
    let b = "b".repeat(37);
    format!("<aaa> {a} </aaa>\n{{ {a} }}\n<bbb> {b} </bbb>\n{{ {b} }}\n")
}

fn tagged_splitter() -> TextSplitter {
    TextSplitter::new(80, 0.25).with_break_chars(['<', '{'], ['>', '}'])
}

fn assert_covers(text: &str, chunks: &[MemChunk]) {
    let runes: Vec<char> = text.chars().collect();
    assert!(!chunks.is_empty());
    assert_eq!(chunks[0].byte_start, 0);
    assert_eq!(chunks.last().unwrap().byte_end, runes.len());
    assert!(chunks.len() <= runes.len(), "at most one chunk per code point");
    for (n, c) in chunks.iter().enumerate() {
        assert_eq!(c.index, n);
        assert!(c.byte_start < c.byte_end);
        let expected: String = runes[c.byte_start..c.byte_end].iter().collect();
        assert_eq!(c.content, expected);
        assert_eq!(c.query, c.content);
    }
    for pair in chunks.windows(2) {
        assert!(pair[1].byte_start > pair[0].byte_start, "cursor advances");
        assert!(pair[1].byte_start <= pair[0].byte_end, "no gap between chunks");
    }
}

#[test]
fn tagged_blocks_split_on_delimiters() {
    let text = tagged_text();
    let chunks = tagged_splitter().split("/doc", &text).expect("split");

    let spans: Vec<(usize, usize)> = chunks.iter().map(|c| (c.byte_start, c.byte_end)).collect();
    assert_eq!(spans, vec![(0, 98), (44, 143), (93, 185), (137, 186)]);

    let runes: Vec<char> = text.chars().collect();
    for c in &chunks {
        assert!(matches!(runes[c.byte_start], '<' | '{'), "chunk {} starts mid-tag", c.index);
        if c.byte_end < runes.len() {
            assert!(matches!(runes[c.byte_end - 1], '>' | '}'), "chunk {} ends mid-tag", c.index);
        }
    }
    assert!(chunks[0].content.ends_with("<bbb>"));
    assert!(chunks[1].content.starts_with("</aaa>"));
    assert_covers(&text, &chunks);
}

#[test]
fn plain_windows_advance_by_step() {
    let text = "0123456789".repeat(30);
    let chunks = TextSplitter::new(80, 0.25).split("/plain", &text).expect("split");

    for pair in chunks.windows(2) {
        assert_eq!(pair[1].byte_start - pair[0].byte_start, 60);
    }
    for c in &chunks {
        assert!(c.byte_end - c.byte_start <= 80);
    }
    // 300 code points, starts at 0, 60, ..., 240
    assert_eq!(chunks.len(), 5);
    assert_covers(&text, &chunks);
}

#[test]
fn coverage_across_sizes_and_overlaps() {
    let texts = [
        "short".to_string(),
        "héllo wörld ✓ naïve café. ".repeat(20),
        "line one.\nline two.\n{ block }\n<tag>body</tag>\n".repeat(15),
    ];
    for text in &texts {
        for size in [1_usize, 7, 50, 200] {
            for overlap in [0.0_f64, 0.1, 0.5, 0.9, 1.0] {
                let splitter = TextSplitter::new(size, overlap).with_break_chars(['<', '{', '\n'], ['>', '}', '.']);
                let chunks = splitter.split("/p", text).expect("split");
                assert_covers(text, &chunks);
                let Window { size: span, step, check } = splitter.window();
                for c in &chunks {
                    assert!(c.byte_end - c.byte_start <= span + check, "chunk exceeds size plus check");
                }
                for pair in chunks.windows(2) {
                    let plain = pair[0].byte_start + step;
                    assert!(pair[1].byte_start <= plain, "start moved past the plain step");
                    assert!(pair[1].byte_start + check >= plain, "start pulled back more than check");
                }
            }
        }
    }
}

#[test]
fn offsets_are_code_points() {
    let text = "ééééé";
    let chunks = TextSplitter::new(2, 0.5).split("/utf8", text).expect("split");
    assert_eq!(chunks[0].content, "éé");
    assert_eq!((chunks[0].byte_start, chunks[0].byte_end), (0, 2));
    assert_eq!(chunks[1].byte_start, 1);
}

#[test]
fn empty_text_yields_no_chunks() {
    let chunks = TextSplitter::default().split("/empty", "").expect("split");
    assert!(chunks.is_empty());
}

#[test]
fn empty_path_is_invalid_input() {
    let err = TextSplitter::default().split("", "text").unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn parser_requires_textual_payload() {
    let parser = tagged_splitter().parser();

    let err = parser("/doc", &json!({"not": "text"})).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    let err = parser("", &json!("text")).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    let chunks = parser("/doc", &json!(tagged_text())).expect("parse");
    assert_eq!(chunks.len(), 4);
    assert_eq!(chunks[2].path(), "/doc");
    assert_eq!(chunks[2].byte_start(), 93);
}

#[test]
fn oversized_window_is_one_chunk() {
    let text = "hello <b> world";
    let snapping = TextSplitter::new(usize::MAX, 0.25).with_break_chars(['<'], ['>']);
    let plain = TextSplitter::new(usize::MAX, 0.0);
    for splitter in [snapping, plain] {
        let chunks = splitter.split("/p", text).expect("split");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, text);
        assert_eq!((chunks[0].byte_start, chunks[0].byte_end), (0, text.len()));
    }
}
