//! Main entry point for the varstruct CLI.

use clap::{command, Parser, Subcommand};

use varstruct::{annotate, common};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "VCF variant to protein structure annotation"
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::Args,

    /// The sub command to run
    #[command(subcommand)]
    command: Commands,
}

/// Enum supporting the parsing of top-level commands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Annotate variants with consequences, structures and viewer commands.
    Annotate(annotate::cli::Args),
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();

    // The pipeline awaits across threads, so install the collector globally.
    tracing::subscriber::set_global_default(collector)?;
    tracing::info!("varstruct startup");

    match &cli.command {
        Commands::Annotate(args) => annotate::cli::run(&cli.common, args).await?,
    }

    tracing::info!("All done. Have a nice day!");
    Ok(())
}
