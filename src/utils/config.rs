//! Application configuration constants.
//! Tuning and thresholds in one place.

use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived file names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
    docs_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!("{pkg}.toml"),
                docs_filename: format!("{pkg}.docs.jsonl"),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Config file looked up in the working directory when `--config` is not given.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Default output file for `index`.
    pub fn docs_filename(&self) -> &str {
        &self.docs_filename
    }
}

// ---- Worker threads ----

/// Worker pool sizing.
/// Use [`WorkerThreadLimits::current()`] to fill `all_threads` from rayon; the rest are const.
#[derive(Clone, Copy, Debug)]
pub struct WorkerThreadLimits {
    /// Available threads (from rayon); set by [`WorkerThreadLimits::current()`].
    pub all_threads: usize,
    /// Floor so a pool always has someone to drain the queue.
    pub floor: usize,
}

impl Default for WorkerThreadLimits {
    fn default() -> Self {
        Self {
            all_threads: 0, // use current() to set from rayon
            floor: Self::FLOOR_THREADS,
        }
    }
}

impl WorkerThreadLimits {
    pub const FLOOR_THREADS: usize = 1;

    /// Build limits with `all_threads` set from `rayon::current_num_threads()`.
    pub fn current() -> Self {
        Self {
            all_threads: rayon::current_num_threads(),
            ..Self::default()
        }
    }

    /// Worker count when none is configured: one per available thread, minus the producer.
    pub fn default_workers(&self) -> usize {
        self.all_threads.saturating_sub(1).max(self.floor)
    }
}

// ---- Pipeline ----

/// Queue, pacing and logging intervals for the ingest pipeline.
pub struct PipelineConsts;

impl PipelineConsts {
    /// Work queue capacity between producer and workers.
    pub const CHANNEL_CAP: usize = 100_000;
    /// Pause between spawning the workers and the producer.
    pub const PRODUCER_WARMUP: Duration = Duration::from_millis(10);
    /// Sampling interval of the throughput monitor.
    pub const MONITOR_INTERVAL: Duration = Duration::from_millis(200);
    /// Workers log progress every this many accepted documents.
    pub const PROGRESS_LOG_EVERY: usize = 100_000;
    /// How often the CLI checks whether all workers have exited.
    pub const DONE_POLL: Duration = Duration::from_millis(100);
}

// ---- Normalizer ----

/// Acceptance thresholds for cleaned text.
pub struct NormalizerConsts;

impl NormalizerConsts {
    /// Cleaned text shorter than this (chars) is dropped.
    pub const MIN_CLEAN_TEXT_LENGTH: usize = 20;
    pub const TARGET_LANGUAGE: &'static str = "en";
}

// ---- Scoring ----

/// Dirichlet smoothing parameter used when none is given.
pub const DEFAULT_MU: f64 = 2500.0;

/// Documents printed by `score` when `--top` is not given.
pub const DEFAULT_TOP: usize = 10;
