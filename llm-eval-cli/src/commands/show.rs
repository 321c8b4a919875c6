//! `llm-eval show`: inspect a result artifact, optionally re-scoring it.

use anyhow::{Context as _, Result};
use clap::Args;
use llm_eval_core::{EvalConfig, Scorer};
use llm_eval_metrics::MetricScorer;
use llm_eval_workflow::load_samples;
use std::path::PathBuf;

use crate::output::{OutputFormat, OutputWriter};

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Path to an `<alias>.json` artifact
    pub artifact: PathBuf,

    /// Maximum number of samples to print
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Score the samples with this metric (exact_match, contains, bleu, ...)
    #[arg(short, long)]
    pub metric: Option<String>,
}

pub async fn execute(args: ShowArgs, output: &OutputWriter) -> Result<()> {
    let samples = load_samples(&args.artifact)
        .await
        .with_context(|| format!("Failed to load {}", args.artifact.display()))?;

    output.write_samples(&samples, args.limit)?;

    if let Some(metric) = args.metric {
        let result = MetricScorer::new()
            .evaluate(&samples, &EvalConfig::new(metric))
            .await?;
        match output.format() {
            OutputFormat::Json => eprintln!("{}: {:.4}", result.metric, result.score),
            OutputFormat::Table => output.info(&format!("{}: {:.4}", result.metric, result.score)),
        }
    }

    Ok(())
}
