use std::marker::PhantomData;
use std::time::Duration;

use tracing::warn;

use crate::transport::{TransportError, deadline_after};

/// The cross-process mutual exclusion handle guarding the mailbox buffer.
///
/// Backed by a robust, process-shared pthread mutex living inside the shared
/// segment. Acquisition is always bounded; a holder that dies mid-section is
/// recovered by the next acquirer instead of wedging the transport.
pub struct AccessLock<'segment> {
    mutex: *mut libc::pthread_mutex_t,
    _segment: PhantomData<&'segment ()>
}

impl<'segment> AccessLock<'segment> {
    pub(crate) fn new(mutex: *mut libc::pthread_mutex_t) -> Self {
        Self {
            mutex,
            _segment: PhantomData
        }
    }

    /// Blocks until the lock is held or `timeout` elapses.
    ///
    /// `EOWNERDEAD` means the previous holder terminated while holding the
    /// lock; the mutex is marked consistent and the acquisition succeeds.
    /// The buffer contents are untrusted at that point, which the message
    /// framing already tolerates (a torn write decodes as garbage and is
    /// answered or dropped by the receiver).
    pub fn acquire(&self, timeout: Duration) -> Result<LockGuard<'_>, TransportError> {
        let deadline = deadline_after(timeout)?;

        // SAFETY: mutex points into a live mapping for 'segment and was
        // initialized by the segment creator before being published.
        let rc = unsafe { libc::pthread_mutex_timedlock(self.mutex, &deadline) };

        match rc {
            0 => Ok(LockGuard { mutex: self.mutex, _lock: PhantomData }),
            libc::EOWNERDEAD => {
                warn!("mailbox lock abandoned by a dead process, recovering");
                // SAFETY: we hold the lock in the inconsistent state.
                let rc = unsafe { libc::pthread_mutex_consistent(self.mutex) };
                if rc != 0 {
                    unsafe { libc::pthread_mutex_unlock(self.mutex) };
                    return Err(TransportError::os_code("pthread_mutex_consistent", rc));
                }
                Ok(LockGuard { mutex: self.mutex, _lock: PhantomData })
            }
            libc::ETIMEDOUT => Err(TransportError::LockTimeout),
            other => Err(TransportError::os_code("pthread_mutex_timedlock", other))
        }
    }
}

/// Holds the lock; released on drop on every exit path.
pub struct LockGuard<'lock> {
    mutex: *mut libc::pthread_mutex_t,
    _lock: PhantomData<&'lock ()>
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        // SAFETY: the guard exists only while the lock is held by us.
        unsafe { libc::pthread_mutex_unlock(self.mutex) };
    }
}
