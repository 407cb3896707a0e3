//! pulsewatch CLI
//!
//! Local execution entry point, meant to be invoked on a schedule.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use pulsewatch::{
    error::Result,
    models::{Config, Fact},
    notify::TelegramNotifier,
    pipeline::Monitor,
    storage::{LocalStorage, SnapshotStore},
    utils::http::HttpFetcher,
};

/// pulsewatch - chart, table and CSV change monitor
#[derive(Parser, Debug)]
#[command(
    name = "pulsewatch",
    version,
    about = "Watches public data sources and reports changes to chat"
)]
struct Cli {
    /// Path to storage directory containing config and state files
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Default)]
enum Command {
    /// Check every source once (default)
    #[default]
    Run,

    /// Validate configuration file
    Validate,

    /// Show stored facts and the last heartbeat
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);
    let storage = LocalStorage::new(&cli.storage_dir);

    match cli.command.unwrap_or_default() {
        Command::Run => {
            log::info!("pulsewatch starting...");
            config.validate()?;

            let fetcher = HttpFetcher::from_config(&config.http)?;
            let notifier = TelegramNotifier::from_env(&config.telegram)?;
            if !notifier.is_configured() {
                log::warn!(
                    "{} / {} not set; messages will only be logged",
                    config.telegram.token_env,
                    config.telegram.chat_id_env
                );
            }

            let report = Monitor::new(&config, &fetcher, &storage, &notifier)
                .run(Utc::now())
                .await?;
            for (id, outcome) in &report.sources {
                log::debug!("{id}: {outcome:?}");
            }
            log::info!("Done!");
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK ({} sources)", config.sources.len());
        }

        Command::Info => show_info(&cli.storage_dir, &config, &storage).await?,
    }

    Ok(())
}

async fn show_info(storage_dir: &Path, config: &Config, storage: &LocalStorage) -> Result<()> {
    log::info!("Storage directory: {}", storage_dir.display());

    for source in &config.sources {
        let stored = storage
            .load_record(&source.state_key)
            .await?
            .map(|record| Fact::decode(&source.kind, record));
        match stored {
            Some(Ok(fact)) => println!("{}:\n{}\n", source.label, fact.summary()),
            Some(Err(e)) => println!("{}: unreadable record ({})\n", source.label, e),
            None => println!("{}: (no data yet)\n", source.label),
        }
    }

    match storage.load_heartbeat(&config.heartbeat.state_key).await? {
        Some(state) => println!("Last heartbeat: {}", state.ts.to_rfc3339()),
        None => println!("Last heartbeat: never"),
    }
    Ok(())
}
