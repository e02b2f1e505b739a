use std::sync::Arc;

use ragdb_core::traits::Database;
use ragdb_core::{Chunk, Embedding, Error, MemChunk, DOCUMENT_PATH_NONE};
use ragdb_vector::{cosine_top_k, MemoryDatabase};
use serde_json::json;

fn chunk(path: &str, index: usize, content: &str, embedding: Embedding) -> Arc<dyn Chunk> {
    Arc::new(MemChunk {
        index,
        path: path.to_string(),
        query: content.to_string(),
        content: content.to_string(),
        byte_start: 0,
        byte_end: content.chars().count(),
        embedding,
        ..MemChunk::default()
    })
}

fn contents(chunks: &[Arc<dyn Chunk>]) -> Vec<String> {
    chunks.iter().map(|c| c.content().to_string()).collect()
}

#[test]
fn append_keeps_snapshots_and_save_replaces_them() {
    let db = MemoryDatabase::default();
    db.append_chunks("/doc", json!("v1"), vec![chunk("/doc", 0, "c1", vec![1.0, 0.0])]).unwrap();
    db.append_chunks("/doc", json!("v2"), vec![chunk("/doc", 0, "c2", vec![0.0, 1.0])]).unwrap();

    assert_eq!(contents(&db.get_path_chunks("/doc").unwrap()), vec!["c1", "c2"]);
    assert_eq!(db.get_documents("/doc").unwrap().len(), 2);

    db.save_chunks("/doc", json!("v3"), vec![chunk("/doc", 0, "c3", vec![1.0, 1.0])]).unwrap();
    assert_eq!(contents(&db.get_path_chunks("/doc").unwrap()), vec!["c3"]);
    let docs = db.get_documents("/doc").unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].payload, json!("v3"));
}

#[test]
fn lookups_report_missing_paths() {
    let db = MemoryDatabase::default();
    assert!(matches!(db.get_documents("/nope"), Err(Error::NotFound(_))));
    assert!(matches!(db.get_path_chunks("/nope"), Err(Error::NotFound(_))));
    assert!(matches!(db.del_documents("/nope"), Err(Error::NotFound(_))));
    assert!(matches!(db.search_chunks("/nope", &[vec![1.0]], 3), Err(Error::NotFound(_))));

    db.save_chunks("/a", json!(null), vec![chunk("/a", 0, "x", vec![1.0])]).unwrap();
    assert!(matches!(db.get_document_chunk("/a", 1), Err(Error::NotFound(_))));
    assert_eq!(db.get_document_chunk("/a", 0).unwrap().content(), "x");
}

#[test]
fn empty_path_cannot_be_written() {
    let db = MemoryDatabase::default();
    let err = db.save_chunks(DOCUMENT_PATH_NONE, json!(null), Vec::new()).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn paths_and_chunks_in_path_order() {
    let db = MemoryDatabase::default();
    db.save_chunks("/b", json!(null), vec![chunk("/b", 0, "b0", vec![1.0])]).unwrap();
    db.save_chunks("/a", json!(null), vec![chunk("/a", 0, "a0", vec![1.0]), chunk("/a", 1, "a1", vec![1.0])]).unwrap();

    assert_eq!(db.get_paths().unwrap(), vec!["/a", "/b"]);
    assert_eq!(contents(&db.get_chunks().unwrap()), vec!["a0", "a1", "b0"]);
    assert_eq!(db.len().unwrap(), 3);
    assert_eq!(db.get_path_embeddings("/a").unwrap(), vec![vec![1.0], vec![1.0]]);

    db.del_documents("/a").unwrap();
    assert_eq!(db.get_paths().unwrap(), vec!["/b"]);
}

#[test]
fn search_ranks_by_descending_cosine() {
    let db = MemoryDatabase::new(1, 2);
    let chunks = vec![
        chunk("/d", 0, "east", vec![1.0, 0.0]),
        chunk("/d", 1, "north", vec![0.0, 1.0]),
        chunk("/d", 2, "north-east", vec![1.0, 1.0]),
        chunk("/d", 3, "west", vec![-1.0, 0.0]),
        chunk("/d", 4, "mostly-east", vec![3.0, 1.0]),
    ];
    db.save_chunks("/d", json!(null), chunks).unwrap();

    let queries = vec![vec![1.0, 0.0], vec![0.0, 2.0]];
    let first = db.search_chunks("/d", &queries, 3).unwrap();
    assert_eq!(first.len(), 2);

    let names = |list: &ragdb_core::ScoredChunks| list.iter().map(|s| s.chunk.content().to_string()).collect::<Vec<_>>();
    assert_eq!(names(&first[0]), vec!["east", "mostly-east", "north-east"]);
    assert_eq!(names(&first[1]), vec!["north", "north-east", "mostly-east"]);
    assert!((first[0][0].score - 1.0).abs() < 1e-12);
    for list in &first {
        assert!(list.windows(2).all(|w| w[0].score >= w[1].score));
    }

    for _ in 0..5 {
        let again = db.search_chunks("/d", &queries, 3).unwrap();
        assert_eq!(names(&again[0]), names(&first[0]));
        assert_eq!(names(&again[1]), names(&first[1]));
    }
}

#[test]
fn topk_is_bounded_by_candidates() {
    let db = MemoryDatabase::default();
    db.save_chunks("/d", json!(null), vec![chunk("/d", 0, "a", vec![1.0]), chunk("/d", 1, "b", vec![2.0])]).unwrap();

    let res = db.search_chunks("/d", &[vec![1.0]], 10).unwrap();
    assert_eq!(res[0].len(), 2);

    let res = db.search_chunks("/d", &[vec![1.0], vec![1.0]], 0).unwrap();
    assert_eq!(res.len(), 2);
    assert!(res.iter().all(Vec::is_empty));
}

#[test]
fn sentinel_path_searches_everything() {
    let db = MemoryDatabase::default();
    db.save_chunks("/a", json!(null), vec![chunk("/a", 0, "a", vec![1.0, 0.0])]).unwrap();
    db.save_chunks("/b", json!(null), vec![chunk("/b", 0, "b", vec![0.0, 1.0])]).unwrap();

    let res = db.search_chunks(DOCUMENT_PATH_NONE, &[vec![0.0, 1.0]], 1).unwrap();
    assert_eq!(res[0][0].chunk.path(), "/b");

    let res = db.search_chunks("/a", &[vec![0.0, 1.0]], 5).unwrap();
    assert_eq!(res[0].len(), 1);
    assert_eq!(res[0][0].chunk.path(), "/a");
}

#[test]
fn merged_blocks_match_single_block() {
    let candidates: Vec<Embedding> = (0..257)
        .map(|i| {
            let t = f64::from(i) * 0.37;
            vec![t.sin(), t.cos(), (t * 0.5).sin()]
        })
        .collect();
    let queries: Vec<Embedding> = (0..7).map(|i| vec![f64::from(i), 1.0, -0.5]).collect();

    let whole = cosine_top_k(&queries, &candidates, 9, 1000, 1000);
    let split = cosine_top_k(&queries, &candidates, 9, 2, 16);

    assert_eq!(whole.len(), 7);
    for (a, b) in whole.iter().zip(&split) {
        assert_eq!(a.len(), 9);
        let ai: Vec<usize> = a.iter().map(|s| s.index).collect();
        let bi: Vec<usize> = b.iter().map(|s| s.index).collect();
        assert_eq!(ai, bi);
    }
}

#[test]
fn equal_scores_order_by_position() {
    let candidates = vec![vec![2.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0], vec![5.0, 0.0]];
    let ranked = cosine_top_k(&[vec![1.0, 0.0]], &candidates, 3, 1, 1);
    let indices: Vec<usize> = ranked[0].iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![0, 1, 3]);
}

#[test]
fn unbounded_topk_returns_every_candidate() {
    let db = MemoryDatabase::default();
    db.save_chunks("/d", json!(null), vec![chunk("/d", 0, "a", vec![1.0, 0.0]), chunk("/d", 1, "b", vec![0.0, 1.0])]).unwrap();

    let res = db.search_chunks("/d", &[vec![1.0, 0.0]], usize::MAX).unwrap();
    assert_eq!(res[0].len(), 2);
    assert_eq!(res[0][0].chunk.content(), "a");

    let ranked = cosine_top_k(&[vec![1.0, 0.0]], &[vec![1.0, 0.0], vec![0.0, 1.0]], 1 << 40, 100, 1000);
    assert_eq!(ranked[0].len(), 2);
}
