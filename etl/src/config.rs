//! Pipeline configuration.
//!
//! Paths and the database URL are plain values handed to each stage.
//! [`PipelineConfig::from_env`] reads overrides from the environment (and a
//! `.env` file); the CLI layers its flags on top.

use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const RAW_FILE: &str = "kz.csv";
pub const CLEANED_FILE: &str = "cleaned_kz.csv";
pub const TRANSFORMED_FILE: &str = "transformed_kz.csv";
pub const DATABASE_FILE: &str = "ecommerce.db";

/// Rows per multi-row INSERT.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

pub const ENV_DATA_DIR: &str = "ECOMLOAD_DATA_DIR";
pub const ENV_RAW: &str = "ECOMLOAD_RAW";
pub const ENV_CLEANED: &str = "ECOMLOAD_CLEANED";
pub const ENV_TRANSFORMED: &str = "ECOMLOAD_TRANSFORMED";
pub const ENV_DATABASE_URL: &str = "ECOMLOAD_DATABASE_URL";
pub const ENV_CHUNK_SIZE: &str = "ECOMLOAD_CHUNK_SIZE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Raw export read by the cleaner.
    pub raw_path: PathBuf,
    /// Cleaner output.
    pub cleaned_path: PathBuf,
    /// Transformer input; the cleaned file when unset.
    pub transform_input: Option<PathBuf>,
    /// Transformer output, read by the loader.
    pub transformed_path: PathBuf,
    pub database_url: String,
    pub chunk_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::in_dir(DEFAULT_DATA_DIR)
    }
}

impl PipelineConfig {
    /// Default file names under `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            raw_path: dir.join(RAW_FILE),
            cleaned_path: dir.join(CLEANED_FILE),
            transform_input: None,
            transformed_path: dir.join(TRANSFORMED_FILE),
            database_url: format!("sqlite://{}", dir.join(DATABASE_FILE).display()),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Defaults overridden by `ECOMLOAD_*` variables, after loading `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|_| None)
    }

    /// Like [`from_env`](Self::from_env), with `overrides` consulted before
    /// the environment for every key.
    pub fn from_env_with<F>(overrides: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| overrides(key).or_else(|| env::var(key).ok()))
    }

    /// Like [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(ENV_DATA_DIR) {
            Some(dir) => Self::in_dir(dir),
            None => Self::default(),
        };
        if let Some(v) = lookup(ENV_RAW) {
            config.raw_path = v.into();
        }
        if let Some(v) = lookup(ENV_CLEANED) {
            config.cleaned_path = v.into();
        }
        if let Some(v) = lookup(ENV_TRANSFORMED) {
            config.transformed_path = v.into();
        }
        if let Some(v) = lookup(ENV_DATABASE_URL) {
            config.database_url = v;
        }
        if let Some(v) = lookup(ENV_CHUNK_SIZE) {
            config.chunk_size = parse_chunk_size(ENV_CHUNK_SIZE, &v)?;
        }
        Ok(config)
    }

    pub fn with_transform_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.transform_input = Some(path.into());
        self
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Result<Self, ConfigError> {
        if chunk_size == 0 {
            return Err(invalid("chunk_size", "0", "must be at least 1"));
        }
        self.chunk_size = chunk_size;
        Ok(self)
    }

    /// File the transformer reads.
    pub fn transform_source(&self) -> &Path {
        self.transform_input.as_deref().unwrap_or(self.cleaned_path.as_path())
    }
}

fn parse_chunk_size(key: &str, raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(invalid(key, raw, "must be at least 1")),
        Ok(n) => Ok(n),
        Err(e) => Err(invalid(key, raw, &e.to_string())),
    }
}

fn invalid(key: &str, value: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}
