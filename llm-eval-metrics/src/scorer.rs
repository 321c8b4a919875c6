//! Default [`Scorer`]: averages a per-sample metric over the ordered list.

use async_trait::async_trait;
use llm_eval_core::{CoreError, EvalConfig, EvalResult, MetricCalculator, Result, Sample, Scorer};

use crate::aggregators::MetricAggregator;
use crate::calculators::{
    AccuracyCalculator, BleuCalculator, ComparisonMode, MetricInput, MetricOutput, SmoothingMethod,
};

/// Metric names understood by [`MetricScorer`].
pub const SUPPORTED_METRICS: &[&str] = &[
    "exact_match",
    "accuracy",
    "case_insensitive",
    "contains",
    "similarity",
    "bleu",
];

enum Calculator {
    Accuracy(AccuracyCalculator),
    Bleu(BleuCalculator),
}

impl Calculator {
    fn from_config(config: &EvalConfig) -> Result<Self> {
        if config.metric == "bleu" {
            let mut bleu = BleuCalculator::new(config.arg_usize("max_n").unwrap_or(4));
            if let Some(name) = config.arg_str("smoothing") {
                let smoothing = SmoothingMethod::parse(name).ok_or_else(|| {
                    CoreError::Validation(format!("unknown BLEU smoothing '{}'", name))
                })?;
                bleu = bleu.with_smoothing(smoothing);
            }
            return Ok(Self::Bleu(bleu));
        }

        let mode = ComparisonMode::from_metric_name(&config.metric)
            .ok_or_else(|| CoreError::NotFound(format!("metric '{}'", config.metric)))?;
        let mut accuracy = AccuracyCalculator::new(mode);
        if let Some(threshold) = config.arg_f64("threshold") {
            accuracy = accuracy.with_threshold(threshold);
        }
        Ok(Self::Accuracy(accuracy))
    }

    async fn calculate(&self, sample: &Sample) -> Result<MetricOutput> {
        let input = MetricInput::new(sample.hypothesis.as_str(), sample.reference.as_str());
        match self {
            Self::Accuracy(calc) => calc.calculate(input).await,
            Self::Bleu(calc) => calc.calculate(input).await,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetricScorer;

impl MetricScorer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Scorer for MetricScorer {
    async fn evaluate(&self, samples: &[Sample], config: &EvalConfig) -> Result<EvalResult> {
        let calculator = Calculator::from_config(config)?;
        let mut scores = Vec::with_capacity(samples.len());
        for sample in samples {
            let output = calculator.calculate(sample).await?;
            tracing::trace!(index = sample.index, score = output.score, metadata = %output.metadata, "Scored sample");
            scores.push(output.score);
        }
        let summary = MetricAggregator::aggregate(&scores);

        tracing::debug!(
            metric = %config.metric,
            count = summary.count,
            mean = summary.mean,
            std_dev = summary.std_dev,
            min = summary.min,
            max = summary.max,
            "Scored samples"
        );

        Ok(EvalResult::new(summary.mean, config.metric.clone()))
    }
}
