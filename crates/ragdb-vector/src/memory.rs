use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ragdb_core::config::SearchSettings;
use ragdb_core::traits::Database;
use ragdb_core::{Chunk, Document, Embedding, Error, Payload, Result, ScoredChunk, ScoredChunks, DOCUMENT_PATH_NONE};

use crate::search::{cosine_top_k, DEFAULT_CANDIDATE_BLOCK, DEFAULT_QUERY_BLOCK};

type Snapshots = HashMap<String, Vec<Arc<Document>>>;

/// In-memory store keeping an append-only list of snapshots per path.
#[derive(Debug)]
pub struct MemoryDatabase {
    documents: RwLock<Snapshots>,
    query_block: usize,
    candidate_block: usize,
}

impl Default for MemoryDatabase {
    fn default() -> Self { Self::new(DEFAULT_QUERY_BLOCK, DEFAULT_CANDIDATE_BLOCK) }
}

impl From<&SearchSettings> for MemoryDatabase {
    fn from(s: &SearchSettings) -> Self { Self::new(s.query_block, s.candidate_block) }
}

impl MemoryDatabase {
    pub fn new(query_block: usize, candidate_block: usize) -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            query_block: query_block.max(1),
            candidate_block: candidate_block.max(1),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Snapshots>> {
        self.documents.read().map_err(|_| Error::Store("document map lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Snapshots>> {
        self.documents.write().map_err(|_| Error::Store("document map lock poisoned".into()))
    }

    /// Chunks of every snapshot under `path`, in append order.
    pub fn get_path_chunks(&self, path: &str) -> Result<Vec<Arc<dyn Chunk>>> {
        let documents = self.read()?;
        let snapshots = documents.get(path).ok_or_else(|| not_found(path))?;
        Ok(flatten(snapshots))
    }

    /// Every stored chunk, grouped by path in ascending path order.
    pub fn get_chunks(&self) -> Result<Vec<Arc<dyn Chunk>>> {
        let documents = self.read()?;
        Ok(all_chunks(&documents))
    }

    /// The `index`-th chunk of the flattened chunk list under `path`.
    pub fn get_document_chunk(&self, path: &str, index: usize) -> Result<Arc<dyn Chunk>> {
        self.get_path_chunks(path)?
            .into_iter()
            .nth(index)
            .ok_or_else(|| Error::NotFound(format!("chunk {index} of {path}")))
    }

    /// Embeddings aligned with [`MemoryDatabase::get_path_chunks`].
    pub fn get_path_embeddings(&self, path: &str) -> Result<Vec<Embedding>> {
        Ok(self.get_path_chunks(path)?.iter().map(|c| c.embedding().to_vec()).collect())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.values().flatten().map(|d| d.chunks.len()).sum())
    }

    pub fn is_empty(&self) -> Result<bool> { Ok(self.len()? == 0) }
}

fn not_found(path: &str) -> Error { Error::NotFound(format!("no documents under {path}")) }

fn flatten(snapshots: &[Arc<Document>]) -> Vec<Arc<dyn Chunk>> {
    snapshots.iter().flat_map(|d| d.chunks.iter().cloned()).collect()
}

fn all_chunks(documents: &Snapshots) -> Vec<Arc<dyn Chunk>> {
    let mut paths: Vec<&String> = documents.keys().collect();
    paths.sort();
    paths.into_iter().flat_map(|p| flatten(&documents[p])).collect()
}

fn check_path(path: &str) -> Result<()> {
    if path == DOCUMENT_PATH_NONE {
        return Err(Error::InvalidInput("cannot store chunks under the empty path".into()));
    }
    Ok(())
}

impl Database for MemoryDatabase {
    fn append_chunks(&self, path: &str, payload: Payload, chunks: Vec<Arc<dyn Chunk>>) -> Result<()> {
        check_path(path)?;
        let count = chunks.len();
        let mut documents = self.write()?;
        let snapshots = documents.entry(path.to_string()).or_default();
        snapshots.push(Arc::new(Document::new(path, payload, chunks)));
        tracing::debug!(path, chunks = count, snapshots = snapshots.len(), "appended snapshot");
        Ok(())
    }

    fn save_chunks(&self, path: &str, payload: Payload, chunks: Vec<Arc<dyn Chunk>>) -> Result<()> {
        check_path(path)?;
        let count = chunks.len();
        let mut documents = self.write()?;
        documents.insert(path.to_string(), vec![Arc::new(Document::new(path, payload, chunks))]);
        tracing::debug!(path, chunks = count, "saved snapshot");
        Ok(())
    }

    fn search_chunks(&self, path: &str, embeddings: &[Embedding], topk: usize) -> Result<Vec<ScoredChunks>> {
        let candidates = if path == DOCUMENT_PATH_NONE {
            self.get_chunks()?
        } else {
            self.get_path_chunks(path)?
        };
        let vectors: Vec<&[f64]> = candidates.iter().map(|c| c.embedding()).collect();
        let ranked = cosine_top_k(embeddings, &vectors, topk, self.query_block, self.candidate_block);
        tracing::debug!(path, queries = embeddings.len(), candidates = candidates.len(), topk, "searched chunks");
        Ok(ranked
            .into_iter()
            .map(|list| {
                list.into_iter()
                    .map(|s| ScoredChunk { chunk: Arc::clone(&candidates[s.index]), score: s.score })
                    .collect()
            })
            .collect())
    }

    fn get_documents(&self, path: &str) -> Result<Vec<Arc<Document>>> {
        let documents = self.read()?;
        documents.get(path).cloned().ok_or_else(|| not_found(path))
    }

    fn del_documents(&self, path: &str) -> Result<()> {
        let mut documents = self.write()?;
        documents.remove(path).map(|_| ()).ok_or_else(|| not_found(path))
    }

    fn get_paths(&self) -> Result<Vec<String>> {
        let documents = self.read()?;
        let mut paths: Vec<String> = documents.keys().cloned().collect();
        paths.sort();
        Ok(paths)
    }
}
