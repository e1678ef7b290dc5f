mod db;
mod ingest;
mod monitor;
mod runs;

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "revsync")]
#[command(about = "Incremental app review ingestion with run reporting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one ingestion and print `ROWS_LOADED=<n>` on stdout.
    Ingest,
    /// Run one ingestion under the run reporter (log row + alerts).
    Monitor {
        /// Run the ingestion in this process or as an `ingest` subprocess.
        #[arg(long, value_enum, default_value_t = InvokeMode::Embedded)]
        mode: InvokeMode,
    },
    /// Show recent run-log rows, newest first.
    Runs {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Database utilities.
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the destination database is reachable.
    Ping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InvokeMode {
    Embedded,
    Subprocess,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = revsync_core::load_app_config()?;

    // Logs go to stderr; stdout is reserved for command output.
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Ingest => Ok(ingest::run_ingest(&config).await),
        Commands::Monitor { mode } => Ok(monitor::run_monitor(&config, mode).await),
        Commands::Runs { limit } => {
            runs::print_runs(&config, limit).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            db::ping(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
