use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::Result;
use crate::types::{Chunk, Document, Embedding, Payload, ScoredChunks};

/// The sole boundary to a concrete language-model client.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Compute one vector per input text, in input order. `dimensions` of
    /// `None` means the model's default size.
    async fn embeddings(
        &self,
        ctx: &Context,
        dimensions: Option<usize>,
        texts: &[String],
    ) -> Result<Vec<Embedding>>;
}

/// Parser produced by a [`Splitter`]: `(path, payload) -> chunks`.
pub type ParserFn = Box<dyn Fn(&str, &Payload) -> Result<Vec<Box<dyn Chunk>>> + Send + Sync>;

/// Lets indexing stay agnostic of the payload format.
pub trait Splitter: Send + Sync {
    fn parser(&self) -> ParserFn;
}

pub trait Database: Send + Sync {
    /// Add a snapshot under `path`, keeping earlier ones.
    fn append_chunks(&self, path: &str, payload: Payload, chunks: Vec<Arc<dyn Chunk>>) -> Result<()>;
    /// Replace every snapshot under `path` with a single one.
    fn save_chunks(&self, path: &str, payload: Payload, chunks: Vec<Arc<dyn Chunk>>) -> Result<()>;
    /// One ranked list per query embedding. The path sentinel searches everything.
    fn search_chunks(&self, path: &str, embeddings: &[Embedding], topk: usize) -> Result<Vec<ScoredChunks>>;

    fn get_documents(&self, path: &str) -> Result<Vec<Arc<Document>>>;
    fn del_documents(&self, path: &str) -> Result<()>;
    fn get_paths(&self) -> Result<Vec<String>>;
}

/// Optional hook that reorders retrieval results after the similarity search.
pub trait PostRanker: Send + Sync {
    fn rank(&self, queries: &[String], results: Vec<ScoredChunks>) -> Result<Vec<ScoredChunks>>;
}
