use async_trait::async_trait;
use llm_eval_core::{MetricCalculator, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

use super::{MetricInput, MetricOutput};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingMethod {
    None,
    Add1,
    Add01,
}

impl SmoothingMethod {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::None),
            "add1" => Some(Self::Add1),
            "add01" => Some(Self::Add01),
            _ => None,
        }
    }
}

/// Sentence-level BLEU over lowercase whitespace tokens.
#[derive(Debug, Clone)]
pub struct BleuCalculator {
    pub max_n: usize,
    pub smoothing: SmoothingMethod,
}

impl BleuCalculator {
    pub fn new(max_n: usize) -> Self {
        Self {
            max_n: max_n.max(1),
            smoothing: SmoothingMethod::None,
        }
    }

    pub fn with_smoothing(mut self, smoothing: SmoothingMethod) -> Self {
        self.smoothing = smoothing;
        self
    }

    fn ngram_counts<'a>(tokens: &'a [String], n: usize) -> HashMap<&'a [String], usize> {
        let mut counts = HashMap::new();
        if tokens.len() >= n {
            for window in tokens.windows(n) {
                *counts.entry(window).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Clipped n-gram precision with the configured smoothing.
    fn modified_precision(&self, predicted: &[String], reference: &[String], n: usize) -> f64 {
        let pred_counts = Self::ngram_counts(predicted, n);
        let ref_counts = Self::ngram_counts(reference, n);

        let total: usize = pred_counts.values().sum();
        let clipped: usize = pred_counts
            .iter()
            .map(|(ngram, count)| (*count).min(ref_counts.get(ngram).copied().unwrap_or(0)))
            .sum();

        match self.smoothing {
            SmoothingMethod::None if total == 0 => 0.0,
            SmoothingMethod::None => clipped as f64 / total as f64,
            SmoothingMethod::Add1 => (clipped as f64 + 1.0) / (total as f64 + 1.0),
            SmoothingMethod::Add01 => (clipped as f64 + 0.1) / (total as f64 + 0.1),
        }
    }

    fn brevity_penalty(predicted_len: usize, reference_len: usize) -> f64 {
        if predicted_len == 0 {
            0.0
        } else if predicted_len > reference_len {
            1.0
        } else {
            (1.0 - reference_len as f64 / predicted_len as f64).exp()
        }
    }

    /// Returns the BLEU score and the per-order precisions.
    pub fn calculate_bleu(&self, predicted: &str, reference: &str) -> (f64, Vec<f64>) {
        let tokenize = |text: &str| -> Vec<String> {
            text.split_whitespace().map(|s| s.to_lowercase()).collect()
        };
        let pred_tokens = tokenize(predicted);
        let ref_tokens = tokenize(reference);

        if pred_tokens.is_empty() {
            return (0.0, vec![0.0; self.max_n]);
        }

        let precisions: Vec<f64> = (1..=self.max_n)
            .map(|n| self.modified_precision(&pred_tokens, &ref_tokens, n))
            .collect();

        // Any zero precision zeroes the geometric mean.
        if precisions.iter().any(|p| *p <= 0.0) {
            return (0.0, precisions);
        }

        let log_sum: f64 = precisions.iter().map(|p| p.ln()).sum();
        let geometric_mean = (log_sum / self.max_n as f64).exp();
        let bp = Self::brevity_penalty(pred_tokens.len(), ref_tokens.len());

        (bp * geometric_mean, precisions)
    }
}

impl Default for BleuCalculator {
    fn default() -> Self {
        Self::new(4)
    }
}

#[async_trait]
impl MetricCalculator for BleuCalculator {
    type Input = MetricInput;
    type Output = MetricOutput;

    async fn calculate(&self, input: Self::Input) -> Result<Self::Output> {
        let (score, precisions) = match input.reference.as_deref() {
            Some(reference) => self.calculate_bleu(&input.predicted, reference),
            None => (0.0, vec![0.0; self.max_n]),
        };

        Ok(MetricOutput {
            score,
            metadata: json!({
                "metric": "bleu",
                "max_n": self.max_n,
                "smoothing": self.smoothing,
                "precisions": precisions,
            }),
        })
    }
}
