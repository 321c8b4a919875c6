use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One evaluated example. `index` is the position in the unsharded dataset
/// and the only key used to restore order after gathering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sample {
    pub index: usize,
    pub question: String,
    pub reference: String,
    pub hypothesis: String,
}

impl Sample {
    pub fn new(
        index: usize,
        question: impl Into<String>,
        reference: impl Into<String>,
        hypothesis: impl Into<String>,
    ) -> Self {
        Self {
            index,
            question: question.into(),
            reference: reference.into(),
            hypothesis: hypothesis.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
}

impl Completion {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalResult {
    pub score: f64,
    pub metric: String,
}

impl EvalResult {
    pub fn new(score: f64, metric: impl Into<String>) -> Self {
        Self {
            score,
            metric: metric.into(),
        }
    }
}

/// Key under which a dataset's score is reported: `eval/<alias>-<metric>`.
pub fn metric_key(alias: &str, metric: &str) -> String {
    format!("eval/{}-{}", alias, metric)
}

/// What a full evaluation run produced. Empty on every rank except the
/// coordinator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EvalReport {
    pub metrics: BTreeMap<String, f64>,
    pub output_files: Vec<PathBuf>,
}

impl EvalReport {
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.output_files.is_empty()
    }
}
