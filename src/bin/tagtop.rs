//! tagtop - live top-N of a tagged record log
//!
//! ## Usage
//!
//! ```bash
//! tagtop [-1fV] [-n name] [-d] [-r file] [-i tag] [-x tag] [-I regex] [-X regex] [-C]
//! ```
//!
//! ## Environment Variables
//!
//! - TAGTOP_DECAY - Per-tick decay factor (default: 0.999)
//! - TAGTOP_EVICT_FACTOR - Eviction ratio and rank multiplier (default: 10)
//! - TAGTOP_IDLE_BACKOFF_MS - Sleep when the log has no new records (default: 50, above 0)
//! - TAGTOP_REFRESH_MS - Minimum interval between refreshes (default: 1000, at least 1000)
//! - TAGTOP_INPUT_TIMEOUT_MS - Key wait per dashboard cycle (default: 1000, above 0)
//! - TAGTOP_LOG_DIR - Directory holding `<instance>.tlog` files (default: /var/log/tagtop)
//! - RUST_LOG - Logging level (optional, default: warn)

use clap::Parser;
use std::io;
use tagtop::{
    aggregator_core::Aggregator,
    batch,
    cli::Cli,
    ingestion::{spawn_ingestion, SourceStatus},
    source::{RecordSource, SourceOptions},
    ui, TopConfig, TopError,
};
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and are not failures
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("tagtop: {}", e);
            1
        }
    };

    // The ingestion thread may be parked in a read; exiting ends it
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<(), TopError> {
    let config = TopConfig::from_env()?;
    init_logging(&config);

    log::info!("🚀 Starting tagtop");
    log::info!("   Mode: {}", if cli.once { "batch" } else { "dashboard" });
    let mut options = SourceOptions::new(config.log_dir.clone());
    for (code, value) in cli.source_args() {
        options.arg(code, value.as_deref())?;
    }
    let source = options.open(cli.instance.as_deref())?;
    let aggregator = Aggregator::new(cli.key_mode(), config.policy);
    log::info!("   Key mode: {:?}", aggregator.mode());
    log::info!(
        "   Decay: {} / evict factor: {}",
        aggregator.policy().decay,
        aggregator.policy().evict_factor
    );

    if cli.once {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        batch::run_batch(source, aggregator, &mut out)?;
        return Ok(());
    }

    let source_name = source.name().to_string();
    let shared = aggregator.into_shared();
    let (status_tx, status_rx) = watch::channel(SourceStatus::Streaming);

    // Never joined; the process exits when the dashboard does
    spawn_ingestion(source, shared.clone(), config.idle_backoff, status_tx);

    let ui_handle = tokio::task::spawn_blocking(move || {
        ui::run_ui(shared, status_rx, source_name, &config)
    });

    match ui_handle.await {
        Ok(result) => result?,
        Err(e) => return Err(io::Error::new(io::ErrorKind::Other, e).into()),
    }
    log::info!("UI exited");
    Ok(())
}

/// Logs go to stderr; without RUST_LOG only warnings and errors are shown so
/// the dashboard is not overwritten
fn init_logging(config: &TopConfig) {
    let mut builder = if config.rust_log.is_some() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
    } else {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(log::LevelFilter::Warn);
        builder
    };
    builder.target(env_logger::Target::Stderr).init();
}
