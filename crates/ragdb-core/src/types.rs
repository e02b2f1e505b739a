//! Domain types shared by the splitter, the embedding pipeline and the store.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// Embedding vector produced by an [`EmbeddingModel`](crate::traits::EmbeddingModel).
pub type Embedding = Vec<f64>;

/// Opaque caller metadata carried through indexing unchanged.
pub type Payload = serde_json::Value;

/// Path sentinel meaning "no path": indexing into it is rejected, searching
/// it covers every stored chunk.
pub const DOCUMENT_PATH_NONE: &str = "";

/// Capability set of an indexed span of text.
///
/// The store only talks to chunks through this trait, so callers can bring
/// their own representation. Offsets are in code points, `byte_end` exclusive.
pub trait Chunk: Debug + Send + Sync {
    fn index(&self) -> usize;
    fn set_index(&mut self, index: usize);

    fn path(&self) -> &str;
    fn set_path(&mut self, path: String);

    /// Text sent to the embedding model. May differ from [`Chunk::content`].
    fn query(&self) -> &str;
    fn set_query(&mut self, query: String);

    fn content(&self) -> &str;
    fn set_content(&mut self, content: String);

    fn byte_start(&self) -> usize;
    fn set_byte_start(&mut self, start: usize);

    fn byte_end(&self) -> usize;
    fn set_byte_end(&mut self, end: usize);

    fn payload(&self) -> &Payload;
    fn set_payload(&mut self, payload: Payload);

    fn embedding(&self) -> &[f64];
    fn set_embedding(&mut self, embedding: Embedding);
}

/// The default in-memory chunk.
///
/// - `index`: position within its document, zero-based
/// - `path`: logical document identifier (not a filesystem path)
/// - `query`/`content`: embedded text and the span's text
/// - `byte_start`/`byte_end`: code-point offsets into the source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemChunk {
    pub index: usize,
    pub path: String,
    pub query: String,
    pub content: String,
    pub byte_start: usize,
    pub byte_end: usize,
    #[serde(default)]
    pub payload: Payload,
    #[serde(default)]
    pub embedding: Embedding,
}

impl Chunk for MemChunk {
    fn index(&self) -> usize { self.index }
    fn set_index(&mut self, index: usize) { self.index = index; }

    fn path(&self) -> &str { &self.path }
    fn set_path(&mut self, path: String) { self.path = path; }

    fn query(&self) -> &str { &self.query }
    fn set_query(&mut self, query: String) { self.query = query; }

    fn content(&self) -> &str { &self.content }
    fn set_content(&mut self, content: String) { self.content = content; }

    fn byte_start(&self) -> usize { self.byte_start }
    fn set_byte_start(&mut self, start: usize) { self.byte_start = start; }

    fn byte_end(&self) -> usize { self.byte_end }
    fn set_byte_end(&mut self, end: usize) { self.byte_end = end; }

    fn payload(&self) -> &Payload { &self.payload }
    fn set_payload(&mut self, payload: Payload) { self.payload = payload; }

    fn embedding(&self) -> &[f64] { &self.embedding }
    fn set_embedding(&mut self, embedding: Embedding) { self.embedding = embedding; }
}

/// One immutable snapshot of chunks stored under a path.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: String,
    pub payload: Payload,
    pub chunks: Vec<Arc<dyn Chunk>>,
}

impl Document {
    pub fn new(path: impl Into<String>, payload: Payload, chunks: Vec<Arc<dyn Chunk>>) -> Self {
        Self { path: path.into(), payload, chunks }
    }
}

/// A chunk paired with its similarity to one query. Higher is better.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Arc<dyn Chunk>,
    pub score: f64,
}

/// Ranked results for one query, descending by score.
pub type ScoredChunks = Vec<ScoredChunk>;
