use std::io::stderr;
use std::process::exit;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, fmt};

use shm_bank_engine::ledger::{Ledger, default_seed, load_seed_csv};
use shm_bank_engine::server::{FileAuditSink, RequestDispatcher};
use shm_bank_engine::transport::TransportConfig;

fn main() -> Result<()> {
    //NOTE: Two positional arguments do not justify pulling in clap.
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        eprintln!("Usage: bank-server [accounts.csv] [log_level]");
        eprintln!("Available log levels: error, warn, info, debug, trace (default: info)");
        exit(0);
    }

    let seed_path = args.get(1);
    let log_level = args
        .get(2)
        .map(|value| parse_log_level(value))
        .unwrap_or(LevelFilter::INFO);

    setup_logging(log_level);

    let ledger = Arc::new(Ledger::new());
    match seed_path {
        Some(path) => {
            ledger.seed(load_seed_csv(path)?);
            info!("Seeded {} accounts from {path}", ledger.len());
        }
        None => {
            ledger.seed(default_seed());
            info!("Seeded {} built-in accounts", ledger.len());
        }
    }

    let audit = Arc::new(FileAuditSink::new("logs.json")?);
    let config = TransportConfig::default();
    let dispatcher = RequestDispatcher::bind(&config, ledger, audit)?;

    info!("Bank server started, shared memory created under namespace [{}]", config.namespace);

    // Runs until the process is killed.
    dispatcher.run();

    Ok(())
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'info'", level);
            LevelFilter::INFO
        }
    }
}

fn setup_logging(level: LevelFilter) {
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}
