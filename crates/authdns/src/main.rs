mod config;

use std::env;
use std::collections::HashSet;
use std::process;
use std::sync::Arc;

use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use dns_store::Store;

/// Initialise the tracing subscriber, honouring `RUST_LOG` and an
/// optional `RUST_LOG_FORMAT` (comma-separated: `json`, `pretty`,
/// `compact`, `no-ansi`, `no-time`).
fn begin_logging() {
    let log_format = if let Ok(var) = env::var("RUST_LOG_FORMAT") {
        var.split(',').map(str::to_string).collect()
    } else {
        HashSet::new()
    };

    let logger = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(!log_format.contains("no-ansi"));

    if log_format.contains("json") {
        if log_format.contains("no-time") {
            logger.json().without_time().init();
        } else {
            logger.json().init();
        }
    } else if log_format.contains("pretty") {
        if log_format.contains("no-time") {
            logger.pretty().without_time().init();
        } else {
            logger.pretty().init();
        }
    } else if log_format.contains("no-time") {
        logger.without_time().init();
    } else {
        logger.init();
    }
}

/// An authoritative DNS server: answers A/AAAA/CNAME/PTR/MX/TXT/SRV
/// queries from an in-memory record set, with no forwarding or
/// recursion to any upstream resolver.
#[derive(Debug, Parser)]
struct Args {
    /// Address to bind the UDP socket on. Empty or "localhost" binds
    /// 127.0.0.1.
    #[clap(short, long, env, default_value = "")]
    bind_address: String,

    /// Port to bind the UDP socket on. Non-positive falls back to 53.
    #[clap(short, long, env, default_value_t = 53)]
    port: i32,

    /// Path to an optional YAML file of records to seed the store
    /// with at startup, inserted one at a time via the store's own
    /// add operation
    #[clap(short, long, env)]
    seed_file: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    begin_logging();

    let store = Arc::new(Store::new());

    if let Some(path) = &args.seed_file {
        match config::load_seed_records(path) {
            Ok(records) => {
                let count = records.len();
                for record in records {
                    let _ = store.add(record).await;
                }
                tracing::info!(%count, %path, "loaded seed records");
            }
            Err(error) => {
                tracing::error!(?error, %path, "could not load seed file");
                process::exit(1);
            }
        }
    }

    let (fatal_tx, mut fatal_rx) = mpsc::channel(1);

    let socket = match dns_store::bind(&args.bind_address, args.port, &fatal_tx).await {
        Some(socket) => socket,
        None => {
            if let Some(error) = fatal_rx.recv().await {
                tracing::error!(?error, "fatal error during startup, shutting down");
            }
            process::exit(1);
        }
    };

    tokio::spawn(dns_store::listen(Arc::clone(&store), socket, fatal_tx));

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(error) => {
            tracing::error!(?error, "could not subscribe to SIGTERM");
            process::exit(1);
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received SIGINT, shutting down");
        }
        _ = sigterm.recv() => {
            tracing::info!("received SIGTERM, shutting down");
        }
        Some(error) = fatal_rx.recv() => {
            tracing::error!(?error, "fatal error, shutting down");
            process::exit(1);
        }
    }
}
