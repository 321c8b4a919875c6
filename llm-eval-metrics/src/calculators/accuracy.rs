use async_trait::async_trait;
use llm_eval_core::{MetricCalculator, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;

use super::{MetricInput, MetricOutput};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    ExactMatch,
    CaseInsensitive,
    Contains,
    Similarity,
}

impl ComparisonMode {
    /// Metric name used in dataset configurations.
    pub fn metric_name(&self) -> &'static str {
        match self {
            Self::ExactMatch => "exact_match",
            Self::CaseInsensitive => "case_insensitive",
            Self::Contains => "contains",
            Self::Similarity => "similarity",
        }
    }

    pub fn from_metric_name(name: &str) -> Option<Self> {
        match name {
            "exact_match" | "accuracy" => Some(Self::ExactMatch),
            "case_insensitive" => Some(Self::CaseInsensitive),
            "contains" => Some(Self::Contains),
            "similarity" => Some(Self::Similarity),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccuracyCalculator {
    pub mode: ComparisonMode,
    pub similarity_threshold: f64,
}

impl AccuracyCalculator {
    pub fn new(mode: ComparisonMode) -> Self {
        Self {
            mode,
            similarity_threshold: 0.8,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// 1.0 on a match, 0.0 otherwise.
    pub fn score(&self, predicted: &str, reference: &str) -> f64 {
        let matched = match self.mode {
            ComparisonMode::ExactMatch => predicted.trim() == reference.trim(),
            ComparisonMode::CaseInsensitive => {
                predicted.trim().to_lowercase() == reference.trim().to_lowercase()
            }
            ComparisonMode::Contains => {
                let pred = predicted.trim().to_lowercase();
                let refer = reference.trim().to_lowercase();
                pred.contains(&refer) || refer.contains(&pred)
            }
            ComparisonMode::Similarity => {
                word_overlap(predicted, reference) >= self.similarity_threshold
            }
        };

        if matched {
            1.0
        } else {
            0.0
        }
    }
}

/// Jaccard similarity of the lowercase word sets.
pub fn word_overlap(predicted: &str, reference: &str) -> f64 {
    let pred_lower = predicted.to_lowercase();
    let ref_lower = reference.to_lowercase();
    let pred_words: HashSet<_> = pred_lower.split_whitespace().collect();
    let ref_words: HashSet<_> = ref_lower.split_whitespace().collect();

    if pred_words.is_empty() && ref_words.is_empty() {
        return 1.0;
    }
    if pred_words.is_empty() || ref_words.is_empty() {
        return 0.0;
    }

    let intersection = pred_words.intersection(&ref_words).count();
    let union = pred_words.union(&ref_words).count();

    intersection as f64 / union as f64
}

impl Default for AccuracyCalculator {
    fn default() -> Self {
        Self::new(ComparisonMode::ExactMatch)
    }
}

#[async_trait]
impl MetricCalculator for AccuracyCalculator {
    type Input = MetricInput;
    type Output = MetricOutput;

    async fn calculate(&self, input: Self::Input) -> Result<Self::Output> {
        let score = input
            .reference
            .as_deref()
            .map(|reference| self.score(&input.predicted, reference))
            .unwrap_or(0.0);

        Ok(MetricOutput {
            score,
            metadata: json!({
                "metric": self.mode.metric_name(),
                "comparison_mode": self.mode,
                "threshold": self.similarity_threshold,
            }),
        })
    }
}
