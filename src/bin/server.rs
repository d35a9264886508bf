//! gradestore Server Binary
//!
//! Starts the TCP server for gradestore.

use std::sync::Arc;

use clap::{Parser, ValueEnum};
use gradestore::config::{ConcurrencyMode, FramingMode, NamePolicy};
use gradestore::network::Server;
use gradestore::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// gradestore Server
#[derive(Parser, Debug)]
#[command(name = "gradestore-server")]
#[command(about = "TCP grade-record store")]
#[command(version)]
struct Args {
    /// Directory holding calificaciones.csv
    #[arg(short, long, default_value = ".")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:12345")]
    listen: String,

    /// Worker threads; 0 serves one connection at a time
    #[arg(short, long, default_value = "0")]
    workers: usize,

    /// Connections queued for the worker pool
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Request framing
    #[arg(long, value_enum, default_value = "single-read")]
    framing: Framing,

    /// Largest accepted command in bytes
    #[arg(long, default_value = "4096")]
    max_command_size: usize,

    /// Read/write timeout in milliseconds (0 = none)
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    /// Reject a new subject whose name differs from the one stored for the id
    #[arg(long)]
    strict_names: bool,

    /// Skip fsync when rewriting the table
    #[arg(long)]
    no_sync: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Framing {
    /// Newline-terminated commands
    Line,
    /// One read per command
    SingleRead,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gradestore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("gradestore Server v{}", gradestore::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    let concurrency = match args.workers {
        0 => ConcurrencyMode::Sequential,
        workers => ConcurrencyMode::Pooled { workers },
    };
    let framing = match args.framing {
        Framing::Line => FramingMode::Line,
        Framing::SingleRead => FramingMode::SingleRead,
    };
    let name_policy = if args.strict_names {
        NamePolicy::Strict
    } else {
        NamePolicy::Permissive
    };

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .concurrency(concurrency)
        .max_connections(args.max_connections)
        .framing(framing)
        .max_command_size(args.max_command_size)
        .read_timeout_ms(args.timeout_ms)
        .write_timeout_ms(args.timeout_ms)
        .name_policy(name_policy)
        .sync_writes(!args.no_sync)
        .build();

    // Open engine
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Engine initialized with {} records",
        engine.store().len()
    );

    let server = match Server::bind(config, engine) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    // Set up Ctrl+C handler
    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, initiating shutdown...");
        shutdown.shutdown();
    }) {
        tracing::warn!("Failed to install Ctrl+C handler: {}", e);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
