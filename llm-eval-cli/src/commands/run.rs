//! `llm-eval run`: evaluate every configured dataset on this rank.

use anyhow::{bail, Context as _, Result};
use clap::Args;
use llm_eval_core::Topology;
use llm_eval_metrics::MetricScorer;
use llm_eval_workflow::{
    ChatCompletionsBackend, Collective, EvaluationDriver, FileCollective, JsonlDatasetProvider,
    LocalCollective,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::EvalSettings;
use crate::output::OutputWriter;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Settings file (TOML, YAML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of ranks taking part in the run
    #[arg(long, env = "WORLD_SIZE", default_value = "1")]
    pub world_size: usize,

    /// This process's rank; rank 0 gathers, scores and writes results
    #[arg(long, env = "LOCAL_RANK", default_value = "0")]
    pub local_rank: usize,

    /// Directory for `<alias>.json` result files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Directory holding `<alias>.jsonl` datasets
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Base URL of an OpenAI-compatible server
    #[arg(long)]
    pub inference_url: Option<String>,

    /// Model name sent with every request
    #[arg(long)]
    pub model: Option<String>,

    /// Bearer token for the inference server
    #[arg(long, env = "LLM_EVAL_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Shared directory used to exchange results between ranks
    #[arg(long)]
    pub rendezvous_dir: Option<PathBuf>,

    /// Names this run's subdirectory under the rendezvous directory
    #[arg(long, env = "LLM_EVAL_RUN_ID")]
    pub run_id: Option<String>,

    /// Only evaluate these aliases (repeatable)
    #[arg(long = "dataset")]
    pub datasets: Vec<String>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl RunArgs {
    /// Command-line values win over file and environment settings.
    pub fn apply(&self, settings: &mut EvalSettings) -> Result<()> {
        if let Some(dir) = &self.output_dir {
            settings.output_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.data_dir {
            settings.data_dir = dir.clone();
        }
        if let Some(url) = &self.inference_url {
            settings.inference.base_url = url.clone();
        }
        if let Some(model) = &self.model {
            settings.inference.model = model.clone();
        }
        if let Some(key) = &self.api_key {
            settings.inference.api_key = Some(key.clone());
        }
        if let Some(dir) = &self.rendezvous_dir {
            settings.collective.rendezvous_dir = dir.clone();
        }
        if let Some(run_id) = &self.run_id {
            settings.collective.run_id = Some(run_id.clone());
        }

        if !self.datasets.is_empty() {
            if let Some(missing) = self
                .datasets
                .iter()
                .find(|alias| !settings.datasets.iter().any(|d| &d.alias == *alias))
            {
                bail!("Dataset '{}' is not configured", missing);
            }
            settings.datasets.retain(|d| self.datasets.contains(&d.alias));
        }

        Ok(())
    }
}

pub async fn execute(args: RunArgs, output: &OutputWriter) -> Result<()> {
    let mut settings = EvalSettings::load(args.config.as_deref())?;
    args.apply(&mut settings)?;

    if settings.datasets.is_empty() {
        bail!("No datasets configured; add [[datasets]] entries to the settings file");
    }

    let topology = Topology::new(args.world_size, args.local_rank).context("Invalid rank topology")?;
    tracing::info!(
        "Starting evaluation as {} with {} dataset(s)",
        topology,
        settings.datasets.len()
    );

    let backend = build_backend(&settings)?;
    let collective = build_collective(&settings, topology)?;
    let mut driver = EvaluationDriver::new(
        Arc::new(JsonlDatasetProvider::new(&settings.data_dir)),
        Arc::new(backend),
        Arc::new(MetricScorer::new()),
        collective,
    )
    .with_policy(settings.policy.to_policy())
    .with_progress(!args.no_progress);
    if let Some(dir) = &settings.output_dir {
        driver = driver.with_output_dir(dir.clone());
    }

    let report = driver.run(&settings.datasets).await.context("Evaluation failed")?;

    if topology.is_coordinator() {
        output.write_report(&report)?;
        output.success(&format!("Evaluated {} dataset(s)", settings.datasets.len()));
    } else {
        tracing::info!("Rank {} finished; results are on rank 0", topology.local_rank());
    }

    Ok(())
}

fn build_backend(settings: &EvalSettings) -> Result<ChatCompletionsBackend> {
    let inference = &settings.inference;
    let backend = match inference.request_timeout_secs {
        Some(secs) => ChatCompletionsBackend::with_request_timeout(
            &inference.base_url,
            inference.model.clone(),
            Duration::from_secs(secs),
        ),
        None => ChatCompletionsBackend::new(&inference.base_url, inference.model.clone()),
    }
    .context("Failed to create inference backend")?;

    tracing::debug!("Inference endpoint: {}", backend.endpoint());

    Ok(match &inference.api_key {
        Some(key) => backend.with_api_key(key.clone()),
        None => backend,
    })
}

/// A single rank needs no exchange; several ranks meet in
/// `<rendezvous_dir>/<run_id>`, which must not hold an earlier run.
fn build_collective(settings: &EvalSettings, topology: Topology) -> Result<Arc<dyn Collective>> {
    if topology.world_size() == 1 {
        return Ok(Arc::new(LocalCollective));
    }

    let collective_settings = &settings.collective;
    let Some(run_dir) = collective_settings.run_dir() else {
        bail!("Multi-rank runs need a unique --run-id (or LLM_EVAL_RUN_ID) shared by all ranks");
    };
    let mut collective = FileCollective::new(run_dir, topology)
        .with_poll_interval(Duration::from_millis(collective_settings.poll_interval_ms));
    if let Some(secs) = collective_settings.timeout_secs {
        collective = collective.with_timeout(Duration::from_secs(secs));
    }
    tracing::info!("Exchanging results through {}", collective.root().display());

    Ok(Arc::new(collective))
}
