//! Index a few snippets with the offline hash embedder and query them.
//!
//! Run with `RAGDB_LOG=debug` to see per-batch pipeline events.
use std::sync::Arc;

use anyhow::Result;
use ragdb_core::config::Config;
use ragdb_core::telemetry::init_tracing;
use ragdb_core::{Context, DOCUMENT_PATH_NONE};
use ragdb_embed::HashEmbedder;
use ragdb_rag::Rag;
use ragdb_text::TextSplitter;
use serde_json::json;

const DOCS: &[(&str, &str)] = &[
    ("/notes/rust", "<p> Ownership and borrowing keep memory safe without a garbage collector. </p>\n{ traits describe shared behaviour }"),
    ("/notes/tokio", "<p> Tokio schedules async tasks on a work stealing pool. </p>\n{ semaphores bound concurrency }"),
    ("/notes/rayon", "<p> Rayon turns iterators into parallel iterators. </p>\n{ par_iter splits work across threads }"),
];

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let settings = Config::load()?.settings()?;
    let rag = Rag::from_settings(Arc::new(HashEmbedder::default()), &settings);
    let splitter = TextSplitter::from(&settings.splitter).with_break_chars(['<', '{'], ['>', '}']);
    let ctx = Context::background();

    for (path, text) in DOCS {
        rag.indexing(&ctx, path, json!(text), &splitter, true).await?;
    }

    let queries = vec!["semaphores bound concurrency".to_string(), "parallel iterators".to_string()];
    let results = rag.retrieval(&ctx, DOCUMENT_PATH_NONE, &queries, 2).await?;
    for (query, hits) in queries.iter().zip(results) {
        println!("{query}");
        for hit in hits {
            println!("  {:.3}  {}  {}", hit.score, hit.chunk.path(), hit.chunk.content().trim());
        }
    }
    Ok(())
}
