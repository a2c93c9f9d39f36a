//! voxreel command line driver
//!
//! Thin front-end over the voxreel-core planning engine: parse arguments,
//! wire collaborators together, write the outputs. All planning logic lives
//! in the library.

mod commands;

use clap::{Parser, Subcommand};

use commands::captions::CaptionsArgs;
use commands::plan::PlanArgs;
use commands::probe::ProbeArgs;
use commands::select::SelectArgs;

#[derive(Parser, Debug)]
#[command(name = "voxreel", version, about, long_about = None)]
struct Cli {
    /// Log planning decisions, not only warnings
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve timeline documents into render plans
    Plan(PlanArgs),
    /// Print a media file's duration in seconds
    Probe(ProbeArgs),
    /// Pick media from a pool, avoiding recent repeats
    Select(SelectArgs),
    /// Compose an ASS subtitle document from SRT or word timing
    Captions(CaptionsArgs),
}

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let env_filter =
        tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into());

    // Diagnostics go to stderr; stdout carries command output only.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Plan(args) => commands::plan::run(args).await,
        Commands::Probe(args) => commands::probe::run(args).await,
        Commands::Select(args) => commands::select::run(args),
        Commands::Captions(args) => commands::captions::run(args),
    }
}
