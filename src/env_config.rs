//! Shared environment configuration for the binaries.
//!
//! Consolidates the `CAUSAL_LAB_THREADS` and `RUST_LOG` reads.

use tracing_subscriber::EnvFilter;

/// Default rayon pool size when no environment override is set.
const DEFAULT_THREADS: usize = 8;

/// Read `CAUSAL_LAB_THREADS` (fallback `RAYON_NUM_THREADS`, default 8) and
/// build the rayon global pool. Tolerates an already-initialized pool.
/// Returns thread count.
pub fn init_rayon_threads() -> usize {
    let num_threads = std::env::var("CAUSAL_LAB_THREADS")
        .or_else(|_| std::env::var("RAYON_NUM_THREADS"))
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&n: &usize| n > 0)
        .unwrap_or(DEFAULT_THREADS);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .ok(); // May fail if already initialized
    num_threads
}

/// Install a stderr `fmt` subscriber filtered by `RUST_LOG` (default `info`).
/// A second call is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}
