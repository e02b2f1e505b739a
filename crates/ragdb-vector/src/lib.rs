//! ragdb-vector
//!
//! In-memory snapshot store with partitioned top-k cosine search.
pub mod memory;
pub mod search;

pub use memory::MemoryDatabase;
pub use search::{cosine_top_k, ScoredIndex};
