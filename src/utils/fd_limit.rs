//! File descriptor limit detection for sanity-checking the worker count (Unix).

use log::warn;

/// Estimated descriptors held per worker while its child runs (stdin/stdout/stderr pipes, in/out files).
pub const FDS_PER_WORKER: usize = 6;

/// Fraction of the process FD limit the pool may use (leave headroom for other code).
const FD_LIMIT_FRACTION: f64 = 0.8;

/// Returns the soft limit for max open file descriptors, or `None` if unavailable (e.g. Windows).
#[cfg(unix)]
pub fn max_open_fds() -> Option<u64> {
    use std::mem::MaybeUninit;
    let mut rlim = MaybeUninit::<libc::rlimit>::uninit();
    if unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, rlim.as_mut_ptr()) } != 0 {
        return None;
    }
    let rlim = unsafe { rlim.assume_init() };
    let cur = rlim.rlim_cur;
    // RLIM_INFINITY is typically !0 or u64::MAX; treat as "no practical limit"
    if cur == libc::RLIM_INFINITY || cur > i64::MAX as u64 {
        return None;
    }
    Some(cur)
}

#[cfg(not(unix))]
pub fn max_open_fds() -> Option<u64> {
    None
}

/// Worker count that stays under ~80% of the FD limit, or `None` if no limit is available.
pub fn max_workers_by_fd_limit() -> Option<usize> {
    let limit = max_open_fds()?;
    let usable = (limit as f64 * FD_LIMIT_FRACTION) as usize;
    if usable < FDS_PER_WORKER {
        return Some(1);
    }
    Some(usable / FDS_PER_WORKER)
}

/// Warn when `workers` concurrent children could exhaust descriptors. The count is not changed.
pub fn warn_if_over_fd_limit(workers: usize) {
    if let Some(cap) = max_workers_by_fd_limit()
        && workers > cap
    {
        warn!(
            "{} workers may exceed the open-file limit (~{} fit); raise `ulimit -n` if launches fail",
            workers, cap
        );
    }
}
