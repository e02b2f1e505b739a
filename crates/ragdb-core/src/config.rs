//! Layered configuration for the splitter, the embedding pipeline and search.
//!
//! Uses Figment to merge built-in defaults, `ragdb.toml`, `ragdb.<env>.toml`
//! and `RAGDB_*` env vars. Each section converts into its component's own
//! config type in the crate that owns the component.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::{Error, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 1500;
pub const DEFAULT_OVERLAP: f64 = 0.1;
pub const DEFAULT_BATCH: usize = 16;
pub const DEFAULT_ROUTINES: usize = 4;
pub const DEFAULT_QUERY_BLOCK: usize = 100;
pub const DEFAULT_CANDIDATE_BLOCK: usize = 1000;

pub struct Config {
    figment: Figment,
}

impl Config {
    /// Merge `ragdb.toml`, `ragdb.<env>.toml` and `RAGDB_*` variables.
    ///
    /// The environment name comes from `RAGDB_ENV` (default `dev`). Nested keys
    /// use a double underscore: `RAGDB_EMBEDDING__BATCH=32`.
    pub fn load() -> Result<Self> {
        let env_name = env::var("RAGDB_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(RagSettings::default()))
            .merge(Toml::file("ragdb.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("ragdb.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("ragdb.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("ragdb.test.toml")),
            _ => {}
        }
        figment = figment.merge(env_provider());

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with a single TOML file, then `RAGDB_*` variables.
    pub fn from_file(path: &Path) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(RagSettings::default()))
            .merge(Toml::file(path))
            .merge(env_provider());
        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }

    pub fn settings(&self) -> Result<RagSettings> {
        self.figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

fn env_provider() -> Env {
    Env::prefixed("RAGDB_").ignore(&["ENV", "LOG"]).split("__")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    pub splitter: SplitterSettings,
    pub embedding: EmbeddingSettings,
    pub search: SearchSettings,
}

impl RagSettings {
    pub fn validate(&self) -> Result<()> {
        if self.splitter.chunk_size == 0 {
            return Err(Error::InvalidConfig("splitter.chunk_size must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.splitter.overlap) {
            return Err(Error::InvalidConfig("splitter.overlap must be in [0, 1)".into()));
        }
        if self.embedding.batch == 0 || self.embedding.routines == 0 {
            return Err(Error::InvalidConfig("embedding.batch and embedding.routines must be positive".into()));
        }
        if self.search.query_block == 0 || self.search.candidate_block == 0 {
            return Err(Error::InvalidConfig("search block sizes must be positive".into()));
        }
        Ok(())
    }
}

/// Chunk size is counted in code points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterSettings {
    pub chunk_size: usize,
    pub overlap: f64,
    pub break_start_chars: String,
    pub break_end_chars: String,
}

impl Default for SplitterSettings {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE, overlap: DEFAULT_OVERLAP, break_start_chars: String::new(), break_end_chars: String::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub batch: usize,
    pub routines: usize,
    pub dimensions: Option<usize>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self { Self { batch: DEFAULT_BATCH, routines: DEFAULT_ROUTINES, dimensions: None } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub query_block: usize,
    pub candidate_block: usize,
}

impl Default for SearchSettings {
    fn default() -> Self { Self { query_block: DEFAULT_QUERY_BLOCK, candidate_block: DEFAULT_CANDIDATE_BLOCK } }
}
