//! Application configuration constants.
//! Tuning and thresholds in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived file names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    config_filename: String,
    ignore_filename: &'static str,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                config_filename: format!(".{pkg}.toml"),
                ignore_filename: ".gitignore",
            }
        })
    }

    /// Per-root settings file (e.g. `.locpipe.toml`).
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Ignore file consulted at the walk root.
    pub fn ignore_filename(&self) -> &str {
        self.ignore_filename
    }
}

/// Version-control metadata directories that are never descended into.
pub const EXCLUDED_DIR_NAMES: [&str; 3] = [".git", ".hg", ".svn"];

// ---- Worker threads ----

/// Thread limits for pool sizing.
/// Use [`WorkerThreadLimits::current()`] to fill `all_threads` from rayon; the rest are const.
#[derive(Clone, Copy, Debug)]
pub struct WorkerThreadLimits {
    /// Available threads (from rayon); set by [`WorkerThreadLimits::current()`].
    pub all_threads: usize,
    /// Minimum workers per pool.
    pub floor: usize,
    /// Upper bound for an explicit `--threads` override.
    pub max: usize,
}

impl Default for WorkerThreadLimits {
    fn default() -> Self {
        Self {
            all_threads: 0, // use current() to set from rayon
            floor: Self::FLOOR_THREADS,
            max: Self::MAX_THREADS,
        }
    }
}

impl WorkerThreadLimits {
    pub const FLOOR_THREADS: usize = 1;
    pub const MAX_THREADS: usize = 256;

    /// Build limits with `all_threads` set from `rayon::current_num_threads()`.
    pub fn current() -> Self {
        Self {
            all_threads: rayon::current_num_threads(),
            ..Self::default()
        }
    }

    /// Clamp a requested (or detected) worker count into `[floor, max]`.
    pub fn clamp(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.all_threads)
            .clamp(self.floor, self.max)
    }
}

// ---- Queue capacities ----

/// Per-worker multipliers for the five pipeline queues. Each capacity is `threads * factor`.
/// Queues holding content-less jobs can run far ahead; queues holding file bytes stay small.
pub struct QueueFactors;

impl QueueFactors {
    /// Walker → relay. Discovery is cheap; let it run ahead of disk reads.
    pub const DISCOVERED: usize = 10_000;
    /// Relay → reader pool.
    pub const READ_JOBS: usize = 10;
    /// Reader pool → relay. Carries file content, so bounded tighter than discovery.
    pub const LOADED: usize = 500;
    /// Relay → classifier pool.
    pub const CLASSIFY_JOBS: usize = 1;
    /// Classifier pool → sink. Content already released; only metrics remain.
    pub const COUNTED: usize = 1_000;
    /// Upper bound for any single queue (avoid huge allocation on many-core hosts).
    pub const MAX: usize = 500_000;
}

// ---- Reading ----

/// Content loading limits.
pub struct ReadConsts;

impl ReadConsts {
    /// Files larger than this are memory-mapped instead of buffered (bytes). 16 MB.
    pub const MMAP_THRESHOLD: u64 = 16 * 1024 * 1024;
    /// Default maximum file size; larger files are dropped as read errors (bytes). 64 MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 64 * 1024 * 1024;
}

// ---- Classification ----

/// Number of leading bytes inspected for a NUL byte when deciding whether content is binary.
pub const BINARY_SNIFF_LEN: usize = 8000;
