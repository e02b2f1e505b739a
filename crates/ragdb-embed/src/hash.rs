use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use ragdb_core::traits::EmbeddingModel;
use ragdb_core::{Context, Embedding, Result};
use twox_hash::XxHash64;

/// Deterministic bag-of-tokens embedder for offline runs and tests.
///
/// Each whitespace token is hashed into one dimension; the result is
/// L2-normalized, so identical texts have cosine similarity 1.0.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self { Self::new(Self::DEFAULT_DIM) }
}

impl HashEmbedder {
    pub const DEFAULT_DIM: usize = 256;

    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } }

    pub fn dim(&self) -> usize { self.dim }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn embed_text(&self, text: &str, dim: usize) -> Embedding {
        let dim = dim.max(1);
        let mut v = vec![0f64; dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % dim;
            let val = f64::from((h >> 32) as u32) / f64::from(u32::MAX);
            v[idx] += val + (i % 3) as f64 * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt().max(1e-12);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

#[async_trait]
impl EmbeddingModel for HashEmbedder {
    async fn embeddings(&self, ctx: &Context, dimensions: Option<usize>, texts: &[String]) -> Result<Vec<Embedding>> {
        ctx.check()?;
        let dim = dimensions.filter(|&d| d > 0).unwrap_or(self.dim);
        Ok(texts.iter().map(|t| self.embed_text(t, dim)).collect())
    }
}
