use ragdb_core::config::SplitterSettings;
use ragdb_core::traits::{ParserFn, Splitter};
use ragdb_core::{Chunk, Error, MemChunk, Payload, Result, DOCUMENT_PATH_NONE};

pub use ragdb_core::config::{DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};

const MIN_OVERLAP: f64 = 0.01;
const MAX_OVERLAP: f64 = 0.99;

/// Boundary-aware overlapping splitter.
///
/// Windows of `chunk_size` code points advance by `(1 - overlap) * chunk_size`.
/// When break characters are configured, a chunk end may stretch forward to
/// just after a break-end char, and the next start may pull back onto a
/// break-start char, each by at most `check` code points.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    /// Target span length in code points; `0` selects [`DEFAULT_CHUNK_SIZE`].
    pub chunk_size: usize,
    /// Fraction of a chunk shared with its successor, clamped to `[0.01, 0.99]`.
    pub overlap: f64,
    pub break_start_chars: Vec<char>,
    pub break_end_chars: Vec<char>,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
            break_start_chars: Vec::new(),
            break_end_chars: Vec::new(),
        }
    }
}

impl From<&SplitterSettings> for TextSplitter {
    fn from(s: &SplitterSettings) -> Self {
        Self::new(s.chunk_size, s.overlap)
            .with_break_chars(s.break_start_chars.chars(), s.break_end_chars.chars())
    }
}

/// Effective window: span length, cursor step and snapping radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub size: usize,
    pub step: usize,
    pub check: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, overlap: f64) -> Self {
        Self { chunk_size, overlap, ..Self::default() }
    }

    #[must_use]
    pub fn with_break_chars(
        mut self,
        start: impl IntoIterator<Item = char>,
        end: impl IntoIterator<Item = char>,
    ) -> Self {
        self.break_start_chars = start.into_iter().collect();
        self.break_end_chars = end.into_iter().collect();
        self
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn window(&self) -> Window {
        let size = if self.chunk_size == 0 { DEFAULT_CHUNK_SIZE } else { self.chunk_size };
        let overlap = if self.overlap.is_finite() {
            self.overlap.clamp(MIN_OVERLAP, MAX_OVERLAP)
        } else {
            DEFAULT_OVERLAP
        };
        let step = (((1.0 - overlap) * size as f64) as usize).max(1);
        let check = (step as f64 * 0.5).min(overlap * size as f64) as usize;
        Window { size, step, check }
    }

    /// Split `text` into overlapping chunks tagged with `path`.
    pub fn split(&self, path: &str, text: &str) -> Result<Vec<MemChunk>> {
        if path == DOCUMENT_PATH_NONE {
            return Err(Error::InvalidInput("document path is empty".into()));
        }
        let runes: Vec<char> = text.chars().collect();
        let len = runes.len();
        let Window { size, step, check } = self.window();

        let mut chunks = Vec::new();
        let mut i = 0;
        while i < len {
            let j = self.chunk_end(&runes, i, size, check);
            let content: String = runes[i..j].iter().collect();
            chunks.push(MemChunk {
                index: chunks.len(),
                path: path.to_string(),
                query: content.clone(),
                content,
                byte_start: i,
                byte_end: j,
                payload: Payload::Null,
                embedding: Vec::new(),
            });
            i = self.next_start(&runes, i, step, check);
        }
        tracing::debug!(path, chunks = chunks.len(), size, step, check, "split text");
        Ok(chunks)
    }

    /// Last position in `[i+size, i+size+check]` that follows a break-end char.
    fn chunk_end(&self, runes: &[char], i: usize, size: usize, check: usize) -> usize {
        let len = runes.len();
        let lo = i.saturating_add(size);
        let fallback = lo.min(len);
        if self.break_end_chars.is_empty() {
            return fallback;
        }
        let hi = lo.saturating_add(check).min(len);
        (lo..=hi)
            .rev()
            .find(|&k| k > i && self.break_end_chars.contains(&runes[k - 1]))
            .unwrap_or(fallback)
    }

    /// First position in `[max(i+step-check, i+1), i+step]` holding a break-start char.
    fn next_start(&self, runes: &[char], i: usize, step: usize, check: usize) -> usize {
        let fallback = i.saturating_add(step);
        if self.break_start_chars.is_empty() {
            return fallback;
        }
        let lo = fallback.saturating_sub(check).max(i + 1);
        (lo..=fallback)
            .take_while(|&k| k < runes.len())
            .find(|&k| self.break_start_chars.contains(&runes[k]))
            .unwrap_or(fallback)
    }
}

impl Splitter for TextSplitter {
    fn parser(&self) -> ParserFn {
        let splitter = self.clone();
        Box::new(move |path: &str, payload: &Payload| {
            if path == DOCUMENT_PATH_NONE {
                return Err(Error::InvalidInput("document path is empty".into()));
            }
            let text = payload
                .as_str()
                .ok_or_else(|| Error::InvalidInput("payload is not text".into()))?;
            let chunks = splitter.split(path, text)?;
            Ok(chunks.into_iter().map(|c| Box::new(c) as Box<dyn Chunk>).collect())
        })
    }
}
