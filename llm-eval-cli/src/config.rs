//! Run settings: optional config file, then `LLM_EVAL_*` environment
//! variables, then command-line overrides.

use anyhow::{Context as _, Result};
use config::{Config, Environment, File};
use llm_eval_core::DatasetConfig;
use llm_eval_workflow::InferencePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix for environment overrides. Nested keys use `__`, for example
/// `LLM_EVAL_INFERENCE__BASE_URL`.
pub const ENV_PREFIX: &str = "LLM_EVAL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalSettings {
    pub datasets: Vec<DatasetConfig>,
    /// Where the coordinator writes `<alias>.json`. Nothing is written when unset.
    pub output_dir: Option<PathBuf>,
    pub data_dir: PathBuf,
    pub inference: InferenceSettings,
    pub policy: PolicySettings,
    pub collective: CollectiveSettings,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            datasets: Vec::new(),
            output_dir: None,
            data_dir: PathBuf::from("data"),
            inference: InferenceSettings::default(),
            policy: PolicySettings::default(),
            collective: CollectiveSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            model: "default".to_string(),
            api_key: None,
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    pub timeout_secs: Option<u64>,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            max_retries: 0,
            retry_backoff_ms: 1000,
        }
    }
}

impl PolicySettings {
    pub fn to_policy(&self) -> InferencePolicy {
        InferencePolicy {
            timeout: self.timeout_secs.map(Duration::from_secs),
            max_retries: self.max_retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectiveSettings {
    /// Shared directory all ranks can reach. Each run uses `<dir>/<run_id>`.
    pub rendezvous_dir: PathBuf,
    /// Must be unique per multi-rank run; there is no default.
    pub run_id: Option<String>,
    pub poll_interval_ms: u64,
    pub timeout_secs: Option<u64>,
}

impl Default for CollectiveSettings {
    fn default() -> Self {
        Self {
            rendezvous_dir: PathBuf::from(".llm-eval/rendezvous"),
            run_id: None,
            poll_interval_ms: 200,
            timeout_secs: None,
        }
    }
}

impl CollectiveSettings {
    pub fn run_dir(&self) -> Option<PathBuf> {
        self.run_id.as_ref().map(|id| self.rendezvous_dir.join(id))
    }
}

impl EvalSettings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read settings")?;

        settings
            .try_deserialize()
            .context("Failed to parse settings")
    }
}
