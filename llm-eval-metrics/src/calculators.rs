pub mod accuracy;
pub mod bleu;

pub use accuracy::*;
pub use bleu::*;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricInput {
    pub predicted: String,
    pub reference: Option<String>,
}

impl MetricInput {
    pub fn new(predicted: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            predicted: predicted.into(),
            reference: Some(reference.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricOutput {
    pub score: f64,
    pub metadata: serde_json::Value,
}
