//! ragdb-embed
//!
//! Batch embedding orchestration over any [`EmbeddingModel`]. The
//! [`HashEmbedder`] is a deterministic stand-in model for tests and examples.
//!
//! [`EmbeddingModel`]: ragdb_core::traits::EmbeddingModel
pub mod hash;
pub mod pipeline;

pub use hash::HashEmbedder;
pub use pipeline::{
    EmbeddingAttempt, EmbeddingCallback, EmbeddingConfig, EmbeddingOutcome, EmbeddingPipeline, EmbeddingStage,
};
