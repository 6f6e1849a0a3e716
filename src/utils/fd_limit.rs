//! File descriptor limit detection for capping the reader pool (Unix).

/// File descriptors a reader worker may hold at once (the open file plus a mapping).
pub const FDS_PER_READER: usize = 2;

/// Fraction of the process FD limit handed to readers (the walker holds directory handles too).
const FD_LIMIT_FRACTION: f64 = 0.5;

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

/// Largest reader pool that stays under half the FD limit.
/// Returns `None` if no limit is available (use caller's default).
pub fn max_readers_by_fd_limit() -> Option<usize> {
    let limit = max_open_fds()?;
    let usable = (limit as f64 * FD_LIMIT_FRACTION) as usize;
    if usable < FDS_PER_READER {
        return Some(1);
    }
    Some(usable / FDS_PER_READER)
}

/// Cap `threads` by the FD limit. Logs when the cap applies.
pub fn cap_readers(threads: usize) -> usize {
    match max_readers_by_fd_limit() {
        Some(cap) if cap < threads => {
            log::debug!("Capping reader pool {} -> {} (FD limit)", threads, cap);
            cap
        }
        _ => threads,
    }
}
