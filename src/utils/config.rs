//! Application configuration constants.
//! Names and thresholds in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    staging_dir_name: String,
    config_filename: String,
    stats_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                staging_dir_name: format!(".{pkg}_staging"),
                config_filename: format!(".{pkg}.toml"),
                stats_filename: "stats.csv".to_string(),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Default staging root name, created next to the merged output.
    pub fn staging_dir_name(&self) -> &str {
        &self.staging_dir_name
    }

    /// Config file picked up from the working directory when no `--config` is given.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Stats file name used when `--stats` is given without a path.
    pub fn stats_filename(&self) -> &str {
        &self.stats_filename
    }
}

// ---- Staging layout ----

/// Entry names inside a chunk's staging directory.
pub struct StagingNames;

impl StagingNames {
    pub const INPUT: &'static str = "in";
    pub const OUTPUT: &'static str = "out";
    /// Hex characters of the blake3 content hash kept as a chunk identity.
    pub const HASH_ID_LEN: usize = 16;

    /// `<ordinal:06>-<id>`: keyed by split position so distinct chunks never share a directory.
    pub fn dir_name(ordinal: usize, id: &str) -> String {
        format!("{ordinal:06}-{id}")
    }
}

// ---- Worker threads ----

/// Thread limits for the worker pool.
/// Use [`WorkerThreadLimits::current()`] to fill `all_threads` from rayon; the rest are const.
#[derive(Clone, Copy, Debug)]
pub struct WorkerThreadLimits {
    /// Available threads (from rayon); set by [`WorkerThreadLimits::current()`].
    pub all_threads: usize,
    /// Floor when the available count is unknown.
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

    /// Worker count when none is configured: one per available thread.
    pub fn default_workers(&self) -> usize {
        self.all_threads.max(self.floor)
    }
}

// ---- Stats ----

/// Delimited-text layout of the stats file.
pub struct StatsFormat;

impl StatsFormat {
    pub const DELIMITER: char = ',';
    pub const WORKER_HEADER: &'static str = "Thread #,Runtime(ms),Chunks Run,Avg Time Per Chunk(ms)";
    pub const CHUNK_HEADER: &'static str = "Chunk #,Length,Runtime(ms)";
}

// ---- External merge ----

/// Environment variable carrying the header-line count to an external merge program.
pub const HEADER_LINES_ENV: &str = "SPLITRUN_HEADER_LINES";
