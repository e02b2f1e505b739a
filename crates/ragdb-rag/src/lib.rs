//! ragdb-rag
//!
//! The indexing and retrieval façade: split a payload, embed its chunks,
//! store them, and answer similarity queries against the store.
use std::sync::Arc;

use ragdb_core::config::RagSettings;
use ragdb_core::traits::{Database, EmbeddingModel, PostRanker, Splitter};
use ragdb_core::{Chunk, Context, Embedding, Error, Payload, Result, ScoredChunks, DOCUMENT_PATH_NONE};
use ragdb_embed::{EmbeddingConfig, EmbeddingPipeline, EmbeddingStage};
use ragdb_vector::MemoryDatabase;

pub struct Rag<D = MemoryDatabase>
where
    D: Database,
{
    database: Arc<D>,
    pipeline: EmbeddingPipeline,
    ranker: Option<Arc<dyn PostRanker>>,
}

impl Rag<MemoryDatabase> {
    /// In-memory store and pipeline configured from `settings`.
    pub fn from_settings(model: Arc<dyn EmbeddingModel>, settings: &RagSettings) -> Self {
        Self::new(
            Arc::new(MemoryDatabase::from(&settings.search)),
            EmbeddingPipeline::new(model, EmbeddingConfig::from(&settings.embedding)),
        )
    }
}

impl<D> Rag<D>
where
    D: Database,
{
    pub fn new(database: Arc<D>, pipeline: EmbeddingPipeline) -> Self {
        Self { database, pipeline, ranker: None }
    }

    #[must_use]
    pub fn with_ranker(mut self, ranker: Arc<dyn PostRanker>) -> Self {
        self.ranker = Some(ranker);
        self
    }

    pub fn database(&self) -> &Arc<D> { &self.database }

    pub fn pipeline(&self) -> &EmbeddingPipeline { &self.pipeline }

    /// Split `payload`, embed every chunk and store the result under `path`.
    ///
    /// `overwrite` replaces the snapshots already stored under `path`;
    /// otherwise a new snapshot is appended next to them.
    pub async fn indexing(
        &self,
        ctx: &Context,
        path: &str,
        payload: Payload,
        splitter: &dyn Splitter,
        overwrite: bool,
    ) -> Result<()> {
        if path == DOCUMENT_PATH_NONE {
            return Err(Error::InvalidInput("indexing requires a document path".into()));
        }
        let parser = splitter.parser();
        let mut chunks = parser(path, &payload).map_err(|err| match err {
            Error::InvalidInput(_) | Error::Split(_) => err,
            other => Error::Split(other.to_string()),
        })?;

        let texts: Vec<String> = chunks.iter().map(|c| c.query().to_string()).collect();
        let embeddings = self.pipeline.embed(ctx, EmbeddingStage::Indexing, texts).await.into_result()?;
        if embeddings.len() != chunks.len() {
            return Err(Error::Embedding(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.set_embedding(embedding);
        }

        let count = chunks.len();
        let chunks: Vec<Arc<dyn Chunk>> = chunks.into_iter().map(Arc::from).collect();
        if overwrite {
            self.database.save_chunks(path, payload, chunks)?;
        } else {
            self.database.append_chunks(path, payload, chunks)?;
        }
        tracing::info!(path, chunks = count, overwrite, "indexed document");
        Ok(())
    }

    /// One ranked list per query. [`DOCUMENT_PATH_NONE`] searches every path.
    pub async fn retrieval(&self, ctx: &Context, path: &str, queries: &[String], topk: usize) -> Result<Vec<ScoredChunks>> {
        let embeddings = self.embed_queries(ctx, queries).await?;
        let mut results = self.database.search_chunks(path, &embeddings, topk)?;
        if let Some(ranker) = &self.ranker {
            results = ranker.rank(queries, results)?;
            if results.len() != queries.len() {
                return Err(Error::InvalidInput(format!(
                    "ranker returned {} result lists for {} queries",
                    results.len(),
                    queries.len()
                )));
            }
        }
        tracing::info!(
            path,
            queries = queries.len(),
            topk,
            hits = results.iter().map(Vec::len).sum::<usize>(),
            "retrieved chunks"
        );
        Ok(results)
    }

    /// Embed free-form strings through the retrieval pipeline.
    pub async fn embed_queries(&self, ctx: &Context, queries: &[String]) -> Result<Vec<Embedding>> {
        self.pipeline
            .embed(ctx, EmbeddingStage::Retrieval, queries.to_vec())
            .await
            .into_result()
    }
}
