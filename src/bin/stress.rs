//! TideKV stress driver
//!
//! Hammers an engine with concurrent writers to watch flushes, backpressure
//! and merged reads under load.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use tidekv::{Config, Engine, TideError};
use tracing_subscriber::{fmt, EnvFilter};

/// TideKV write-path stress test
#[derive(Parser, Debug)]
#[command(name = "tidekv-stress")]
#[command(about = "Concurrent write load against a TideKV engine")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./tidekv_data")]
    data_dir: String,

    /// Number of writer threads
    #[arg(short, long, default_value = "8")]
    writers: usize,

    /// Keys written by each writer
    #[arg(short, long, default_value = "100000")]
    keys: u64,

    /// Value size in bytes
    #[arg(long, default_value = "128")]
    value_size: usize,

    /// Memstore size limit in MB before flush
    #[arg(short = 'm', long, default_value = "16")]
    memstore_mb: u64,

    /// Flush attempts per snapshot
    #[arg(long, default_value = "10")]
    flush_retries: u32,

    /// Flush worker threads
    #[arg(long, default_value = "5")]
    pool_size: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tidekv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("TideKV stress v{}", tidekv::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .max_memstore_size(args.memstore_mb * 1024 * 1024)
        .flush_max_retries(args.flush_retries)
        .max_thread_pool_size(args.pool_size)
        .build();

    let engine = match Engine::open(config) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    let rejected = Arc::new(AtomicU64::new(0));
    let started = Instant::now();

    let handles: Vec<_> = (0..args.writers)
        .map(|writer| {
            let engine = Arc::clone(&engine);
            let rejected = Arc::clone(&rejected);
            let value = vec![b'v'; args.value_size];
            let keys = args.keys;
            thread::spawn(move || {
                for i in 0..keys {
                    let key = format!("w{:02}-{:010}", writer, i);
                    // Back off on Full until the flush catches up
                    loop {
                        match engine.put(key.clone(), value.clone()) {
                            Ok(()) => break,
                            Err(TideError::Full { .. }) => {
                                rejected.fetch_add(1, Ordering::Relaxed);
                                thread::sleep(Duration::from_millis(1));
                            }
                            Err(e) => {
                                tracing::error!(writer, "Write failed: {}", e);
                                return;
                            }
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        if handle.join().is_err() {
            tracing::error!("Writer thread panicked");
        }
    }

    let elapsed = started.elapsed();
    let total = args.writers as u64 * args.keys;
    tracing::info!(
        total,
        rejected = rejected.load(Ordering::Relaxed),
        elapsed_ms = elapsed.as_millis() as u64,
        "Writes finished ({:.0} ops/s)",
        total as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );

    match engine.scan() {
        Ok(scan) => {
            let live = scan.filter(|item| item.is_ok()).count();
            tracing::info!(live, runs = engine.run_count(), "Merged scan complete");
        }
        Err(e) => tracing::error!("Scan failed: {}", e),
    }

    match Arc::try_unwrap(engine) {
        Ok(engine) => {
            if let Err(e) = engine.close() {
                tracing::error!("Close failed: {}", e);
                std::process::exit(1);
            }
        }
        Err(_) => tracing::warn!("Engine still shared at exit, skipping close"),
    }
}
