//! Concurrent batch embedding with bounded in-flight calls and caller-driven retry.
//!
//! Texts are cut into contiguous batches; each batch runs as its own tokio
//! task admitted through a semaphore of `routines` permits. Every attempt's
//! outcome is written under one shared lock, after which the optional
//! callback decides whether the batch is attempted again.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use ragdb_core::config::EmbeddingSettings;
use ragdb_core::traits::EmbeddingModel;
use ragdb_core::{Context, Embedding, Error, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub use ragdb_core::config::{DEFAULT_BATCH, DEFAULT_ROUTINES};

/// Which façade operation requested the embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingStage {
    Indexing,
    Retrieval,
}

/// Snapshot handed to the retry callback after each attempt.
#[derive(Debug)]
pub struct EmbeddingAttempt<'a> {
    pub stage: EmbeddingStage,
    pub texts: &'a [String],
    /// Results so far for all texts, including other batches.
    pub embeddings: &'a [Embedding],
    pub batch_start: usize,
    pub batch_end: usize,
    /// Texts whose batch currently holds a successful result.
    pub finished: usize,
    /// Attempts made for this batch, including the current one.
    pub attempts: usize,
    pub error: Option<&'a Error>,
}

/// Returns `true` to run the same batch again.
pub type EmbeddingCallback = Arc<dyn Fn(&EmbeddingAttempt<'_>) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct EmbeddingConfig {
    pub batch: usize,
    pub routines: usize,
    pub dimensions: Option<usize>,
    pub callback: Option<EmbeddingCallback>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { batch: DEFAULT_BATCH, routines: DEFAULT_ROUTINES, dimensions: None, callback: None }
    }
}

impl fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("batch", &self.batch)
            .field("routines", &self.routines)
            .field("dimensions", &self.dimensions)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl From<&EmbeddingSettings> for EmbeddingConfig {
    fn from(s: &EmbeddingSettings) -> Self {
        Self { batch: s.batch, routines: s.routines, dimensions: s.dimensions, callback: None }
    }
}

impl EmbeddingConfig {
    #[must_use]
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&EmbeddingAttempt<'_>) -> bool + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }
}

/// Vectors aligned with the input texts plus the first permanent failure.
///
/// Positions belonging to a failed batch hold empty vectors.
#[derive(Debug)]
pub struct EmbeddingOutcome {
    pub embeddings: Vec<Embedding>,
    pub error: Option<Error>,
}

impl EmbeddingOutcome {
    pub fn into_result(self) -> Result<Vec<Embedding>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.embeddings),
        }
    }
}

struct Progress {
    embeddings: Vec<Embedding>,
    finished: usize,
    error: Option<Error>,
}

impl Progress {
    fn record_failure(&mut self, err: Error) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

pub struct EmbeddingPipeline {
    model: Arc<dyn EmbeddingModel>,
    config: EmbeddingConfig,
}

impl EmbeddingPipeline {
    pub fn new(model: Arc<dyn EmbeddingModel>, config: EmbeddingConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &EmbeddingConfig { &self.config }

    /// Embed `texts`, returning one vector per text in input order.
    ///
    /// Every batch runs to completion even after another batch failed.
    pub async fn embed(&self, ctx: &Context, stage: EmbeddingStage, texts: Vec<String>) -> EmbeddingOutcome {
        let total = texts.len();
        if total == 0 {
            return EmbeddingOutcome { embeddings: Vec::new(), error: None };
        }
        let batch = self.config.batch.max(1);
        let texts: Arc<[String]> = texts.into();
        let progress = Arc::new(Mutex::new(Progress {
            embeddings: vec![Vec::new(); total],
            finished: 0,
            error: None,
        }));
        let semaphore = Arc::new(Semaphore::new(self.config.routines.max(1)));

        let mut tasks = JoinSet::new();
        for start in (0..total).step_by(batch) {
            let job = BatchJob {
                ctx: ctx.clone(),
                stage,
                model: Arc::clone(&self.model),
                dimensions: self.config.dimensions,
                callback: self.config.callback.clone(),
                texts: Arc::clone(&texts),
                start,
                end: (start + batch).min(total),
                progress: Arc::clone(&progress),
            };
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    job.lock().record_failure(Error::Embedding("embedding pool closed".into()));
                    return;
                };
                job.run().await;
            });
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                tracing::error!(error = %err, "embedding batch task aborted");
                lock(&progress).record_failure(Error::Embedding(format!("batch task failed: {err}")));
            }
        }

        let mut progress = lock(&progress);
        let finished = progress.finished;
        let outcome = EmbeddingOutcome {
            embeddings: std::mem::take(&mut progress.embeddings),
            error: progress.error.take(),
        };
        tracing::debug!(?stage, total, finished, batch, failed = outcome.error.is_some(), "embedding pipeline done");
        outcome
    }
}

fn lock(progress: &Mutex<Progress>) -> std::sync::MutexGuard<'_, Progress> {
    // A panicking callback must not take the other batches down with it.
    progress.lock().unwrap_or_else(PoisonError::into_inner)
}

struct BatchJob {
    ctx: Context,
    stage: EmbeddingStage,
    model: Arc<dyn EmbeddingModel>,
    dimensions: Option<usize>,
    callback: Option<EmbeddingCallback>,
    texts: Arc<[String]>,
    start: usize,
    end: usize,
    progress: Arc<Mutex<Progress>>,
}

impl BatchJob {
    fn lock(&self) -> std::sync::MutexGuard<'_, Progress> { lock(&self.progress) }

    async fn run(self) {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let batch = &self.texts[self.start..self.end];
            let result = self
                .ctx
                .run(self.model.embeddings(&self.ctx, self.dimensions, batch))
                .await
                .and_then(|vectors| {
                    if vectors.len() == batch.len() {
                        Ok(vectors)
                    } else {
                        Err(Error::Embedding(format!(
                            "expected {} embeddings, model returned {}",
                            batch.len(),
                            vectors.len()
                        )))
                    }
                });
            if !self.settle(result, attempts) {
                break;
            }
        }
    }

    /// Record one attempt and ask the callback whether to retry.
    fn settle(&self, result: Result<Vec<Embedding>>, attempts: usize) -> bool {
        let len = self.end - self.start;
        let mut progress = self.lock();
        let error = match result {
            Ok(vectors) => {
                for (slot, vector) in progress.embeddings[self.start..self.end].iter_mut().zip(vectors) {
                    *slot = vector;
                }
                progress.finished += len;
                tracing::debug!(start = self.start, end = self.end, attempts, "embedded batch");
                None
            }
            Err(err) => {
                tracing::warn!(start = self.start, end = self.end, attempts, error = %err, "embedding batch failed");
                Some(err)
            }
        };

        let retry = self.callback.as_ref().is_some_and(|callback| {
            callback(&EmbeddingAttempt {
                stage: self.stage,
                texts: &self.texts,
                embeddings: &progress.embeddings,
                batch_start: self.start,
                batch_end: self.end,
                finished: progress.finished,
                attempts,
                error: error.as_ref(),
            })
        });

        match (retry, error) {
            (true, None) => {
                // the batch is in flight again
                progress.finished -= len;
                true
            }
            (true, Some(_)) => true,
            (false, None) => false,
            (false, Some(err)) => {
                for slot in &mut progress.embeddings[self.start..self.end] {
                    slot.clear();
                }
                progress.record_failure(err);
                false
            }
        }
    }
}
