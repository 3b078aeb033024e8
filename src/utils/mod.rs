pub mod config;
pub mod fd_limit;
pub mod logger;
pub mod splitrun_toml;
pub mod tempfiles;

pub use config::*;
pub use fd_limit::{FDS_PER_WORKER, max_open_fds, max_workers_by_fd_limit, warn_if_over_fd_limit};
pub use logger::{Colors, WORKER_THREAD_PREFIX, setup_logging, worker_tag};
pub use splitrun_toml::{RunSettings, SplitrunFile, load_config_file, load_default_config, save_config_file};
pub use tempfiles::{cleanup_staging, prepare_staging_root, temp_path_for};
