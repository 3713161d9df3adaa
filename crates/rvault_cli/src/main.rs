//! Terminal front-end for RV Vault.
//!
//! # Responsibility
//! - Resolve configuration and start logging.
//! - Pick the storage backend and hand control to the interactive shell.

mod command;
mod shell;

use clap::Parser;
use log::error;
use rvault_core::{
    init_logging, AiTextService, GeminiClient, MemoryStorage, SqliteStorage, VaultConfig,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "rvault", version, about = "Personal note vault behind a 3-digit code")]
struct Args {
    /// SQLite file holding the vaults (overrides RVAULT_DB_PATH).
    #[arg(long)]
    db: Option<PathBuf>,
    /// Keep vaults in memory only; nothing is written to disk.
    #[arg(long, conflicts_with = "db")]
    memory: bool,
    /// Absolute directory for log files (overrides RVAULT_LOG_DIR).
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// trace|debug|info|warn|error (overrides RVAULT_LOG_LEVEL).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let mut config = match VaultConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("rvault: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(db) = args.db {
        config.db_path = db;
    }
    if let Some(dir) = args.log_dir {
        config.log_dir = dir;
    }
    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(config.log_level)
        .to_string();

    if let Err(err) = init_logging(&log_level, &config.log_dir) {
        eprintln!("rvault: logging disabled: {err}");
    }

    let ai = AiTextService::new(GeminiClient::new(&config.ai));
    if !ai.completion().has_api_key() {
        println!("AI helpers are unavailable until API_KEY or GEMINI_API_KEY is set.");
    }

    if args.memory {
        shell::run(MemoryStorage::new(), ai).await;
        return ExitCode::SUCCESS;
    }

    match SqliteStorage::open(&config.db_path) {
        Ok(storage) => {
            shell::run(storage, ai).await;
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=cli_start module=cli status=error error={}", err);
            eprintln!(
                "rvault: cannot open vault database `{}`: {err}",
                config.db_path.display()
            );
            ExitCode::FAILURE
        }
    }
}
