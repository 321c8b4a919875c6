use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use validator::Validate;

use crate::error::{CoreError, Result};

// ===== Metric Configuration =====

/// Which metric to compute for a dataset, plus metric-specific parameters
/// (for example `max_n` for BLEU or `threshold` for similarity).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct EvalConfig {
    #[validate(length(min = 1, max = 255))]
    pub metric: String,
    #[serde(default)]
    pub args: HashMap<String, serde_json::Value>,
}

impl EvalConfig {
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            args: HashMap::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.args.insert(key.into(), value);
        self
    }

    pub fn arg_f64(&self, key: &str) -> Option<f64> {
        self.args.get(key).and_then(|v| v.as_f64())
    }

    pub fn arg_usize(&self, key: &str) -> Option<usize> {
        self.args.get(key).and_then(|v| v.as_u64()).map(|v| v as usize)
    }

    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(|v| v.as_str())
    }
}

// ===== Dataset Configuration =====

fn default_batch_size() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct DatasetConfig {
    /// Unique label; names the metric key and the output artifact.
    #[validate(length(min = 1, max = 255))]
    pub alias: String,
    #[serde(default)]
    #[validate(nested)]
    pub eval_config: Option<EvalConfig>,
    #[serde(default = "default_batch_size")]
    #[validate(range(min = 1))]
    pub batch_size: usize,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: f32,
    /// Dataset file, relative to the provider's data directory.
    /// Defaults to `<alias>.jsonl`.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub max_samples: Option<usize>,
}

impl DatasetConfig {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            eval_config: None,
            batch_size: default_batch_size(),
            max_tokens: None,
            temperature: 0.0,
            path: None,
            max_samples: None,
        }
    }

    pub fn with_eval_config(mut self, eval_config: EvalConfig) -> Self {
        self.eval_config = Some(eval_config);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    /// Field validation plus the alias rules the artifact writer relies on.
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(CoreError::Validation(format!(
                "temperature {} for '{}' is outside [0, 2]",
                self.temperature, self.alias
            )));
        }
        if self.alias.contains(['/', '\\']) || self.alias == "." || self.alias == ".." {
            return Err(CoreError::Validation(format!(
                "alias '{}' cannot be used as a file name",
                self.alias
            )));
        }
        Ok(())
    }
}

/// Validates every configuration and rejects duplicate aliases.
pub fn check_dataset_configs(configs: &[DatasetConfig]) -> Result<()> {
    let mut seen = HashSet::new();
    for config in configs {
        config.check()?;
        if !seen.insert(config.alias.as_str()) {
            return Err(CoreError::Validation(format!(
                "duplicate dataset alias '{}'",
                config.alias
            )));
        }
    }
    Ok(())
}

// ===== Generation Parameters =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: Option<u32>,
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: None,
            temperature: 0.0,
        }
    }
}
