//! Server configuration, read from the environment at startup.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{ChurnError, Result};

/// How the model's single-valued output should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Probability,
    /// Raw score; passed through a sigmoid.
    Logit,
}

impl FromStr for OutputKind {
    type Err = ChurnError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "probability" | "proba" => Ok(OutputKind::Probability),
            "logit" => Ok(OutputKind::Logit),
            other => Err(ChurnError::Config(format!(
                "CHURN_MODEL_OUTPUT must be 'probability' or 'logit' (got {other:?})"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Serialized ONNX model
    pub model_path: PathBuf,

    /// JSON array of feature names in model input order
    pub feature_names_path: PathBuf,

    pub version: String,

    pub output_kind: OutputKind,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub model: ModelConfig,

    /// Requests per client IP per minute; 0 disables the limiter
    pub rate_limit_per_minute: u32,

    /// Largest accepted batch
    pub max_batch: usize,

    /// Accepted `X-API-Key` values; empty leaves prediction routes open
    pub api_keys: Vec<String>,

    pub allowed_origins: Vec<String>,

    /// Maximum JSON body size (bytes)
    pub max_body_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            workers: num_cpus::get(),
            model: ModelConfig {
                model_path: PathBuf::from("churn_predictor_pipeline.onnx"),
                feature_names_path: PathBuf::from("feature_names.json"),
                version: "1.0.0".to_string(),
                output_kind: OutputKind::Probability,
            },
            rate_limit_per_minute: 100,
            max_batch: 1000,
            api_keys: Vec::new(),
            allowed_origins: vec![
                "http://localhost:8501".to_string(),
                "http://127.0.0.1:8501".to_string(),
            ],
            max_body_bytes: 1024 * 1024, // 1MB
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, starting from the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.port = parse("PORT", &port)?;
        }
        if let Some(workers) = lookup("WORKERS") {
            config.workers = parse("WORKERS", &workers)?;
            if config.workers == 0 {
                return Err(ChurnError::Config("WORKERS must be at least 1".into()));
            }
        }
        if let Some(path) = lookup("CHURN_MODEL_PATH") {
            config.model.model_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("CHURN_FEATURE_NAMES_PATH") {
            config.model.feature_names_path = PathBuf::from(path);
        }
        if let Some(version) = lookup("CHURN_MODEL_VERSION") {
            config.model.version = version;
        }
        if let Some(kind) = lookup("CHURN_MODEL_OUTPUT") {
            config.model.output_kind = kind.parse()?;
        }
        if let Some(limit) = lookup("CHURN_RATE_LIMIT_PER_MINUTE") {
            config.rate_limit_per_minute = parse("CHURN_RATE_LIMIT_PER_MINUTE", &limit)?;
        }
        if let Some(max_batch) = lookup("CHURN_MAX_BATCH") {
            config.max_batch = parse("CHURN_MAX_BATCH", &max_batch)?;
        }
        if let Some(keys) = lookup("CHURN_API_KEYS") {
            config.api_keys = split_list(&keys);
        }
        if let Some(origins) = lookup("CHURN_ALLOWED_ORIGINS") {
            config.allowed_origins = split_list(&origins);
        }
        if let Some(bytes) = lookup("CHURN_MAX_BODY_BYTES") {
            config.max_body_bytes = parse("CHURN_MAX_BODY_BYTES", &bytes)?;
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ChurnError::Config(format!("{key} has an invalid value: {value:?}")))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
