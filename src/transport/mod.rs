mod config;
mod errors;
mod lock;
mod mailbox;
mod segment;
mod signal;

pub use config::{IDLE_WAIT, LOCK_TIMEOUT, MAILBOX_CAPACITY, RESPONSE_TIMEOUT, TransportConfig};
pub use errors::TransportError;
pub use lock::{AccessLock, LockGuard};
pub use mailbox::Mailbox;
pub use signal::Signal;

use std::time::Duration;

/// Absolute CLOCK_REALTIME deadline `timeout` from now, as required by
/// `pthread_mutex_timedlock` and `sem_timedwait`.
pub(crate) fn deadline_after(timeout: Duration) -> Result<libc::timespec, TransportError> {
    let mut now = libc::timespec { tv_sec: 0, tv_nsec: 0 };

    // SAFETY: clock_gettime only writes into the timespec we hand it.
    if unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut now) } != 0 {
        return Err(TransportError::os("clock_gettime"));
    }

    const NANOS_PER_SEC: i64 = 1_000_000_000;

    let mut sec = now.tv_sec + timeout.as_secs() as libc::time_t;
    let mut nsec = now.tv_nsec + i64::from(timeout.subsec_nanos());
    if nsec >= NANOS_PER_SEC {
        sec += 1;
        nsec -= NANOS_PER_SEC;
    }

    Ok(libc::timespec { tv_sec: sec, tv_nsec: nsec })
}
