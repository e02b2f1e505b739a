//! ragdb-text
//!
//! Splits source text into overlapping, boundary-aware chunks. See
//! [`TextSplitter`] for the windowing rules.
pub mod splitter;

pub use splitter::{TextSplitter, Window, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
