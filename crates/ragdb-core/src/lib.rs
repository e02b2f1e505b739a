#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod context;
pub mod error;
pub mod telemetry;
pub mod traits;
pub mod types;

pub use context::Context;
pub use error::{Error, Result};
pub use types::{Chunk, Document, Embedding, MemChunk, Payload, ScoredChunk, ScoredChunks, DOCUMENT_PATH_NONE};
