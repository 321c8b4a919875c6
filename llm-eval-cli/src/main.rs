use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{run::RunArgs, shard::ShardArgs, show::ShowArgs};
use output::{OutputFormat, OutputWriter};

/// Distributed evaluation driver for chat models
#[derive(Debug, Parser)]
#[command(name = "llm-eval", version, about)]
struct Cli {
    /// Output format
    #[arg(short = 'f', long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Log line format (logs go to stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Evaluate the configured datasets on this rank
    Run(RunArgs),
    /// Print the indices a rank owns
    Shard(ShardArgs),
    /// Print the samples stored in a result artifact
    Show(ShowArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "llm_eval=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let output = OutputWriter::new(cli.format, cli.no_color);

    match cli.command {
        Commands::Run(args) => commands::run::execute(args, &output).await,
        Commands::Shard(args) => commands::shard::execute(args, &output),
        Commands::Show(args) => commands::show::execute(args, &output).await,
    }
}
