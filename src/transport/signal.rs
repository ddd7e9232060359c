use std::ffi::CString;
use std::time::Duration;

use crate::transport::{TransportError, deadline_after};

/// A named, auto-resetting, latching notification flag.
///
/// Backed by a POSIX named semaphore pinned to the values 0 and 1: `raise`
/// posts only when the flag is currently down, so raising an already-raised
/// signal is a no-op and exactly one subsequent `wait` observes each raise.
/// Raising before anyone waits does not lose the notification.
pub struct Signal {
    name: String,
    sem: *mut libc::sem_t,
    owner: bool
}

// sem_post/sem_wait are async-signal-safe and thread-safe on a shared handle.
unsafe impl Send for Signal {}
unsafe impl Sync for Signal {}

impl Signal {
    /// Creates the named semaphore, unsignaled. Server side; a stale object
    /// from a crashed run is unlinked first.
    pub fn create(name: &str) -> Result<Self, TransportError> {
        let c_name = to_c_name(name)?;

        // SAFETY: c_name is NUL-terminated; unlink of a missing name is fine.
        unsafe { libc::sem_unlink(c_name.as_ptr()) };

        let sem = unsafe {
            libc::sem_open(
                c_name.as_ptr(),
                libc::O_CREAT | libc::O_EXCL,
                0o600 as libc::c_uint,
                0 as libc::c_uint
            )
        };
        if sem == libc::SEM_FAILED {
            return Err(TransportError::os("sem_open"));
        }

        Ok(Self {
            name: name.to_string(),
            sem,
            owner: true
        })
    }

    /// Opens an existing semaphore. A missing name means the receiver
    /// process is not running.
    pub fn open(name: &str) -> Result<Self, TransportError> {
        let c_name = to_c_name(name)?;

        let sem = unsafe { libc::sem_open(c_name.as_ptr(), 0) };
        if sem == libc::SEM_FAILED {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::ENOENT) {
                return Err(TransportError::receiver_offline(name));
            }
            return Err(TransportError::Os {
                operation: "sem_open",
                source: err
            });
        }

        Ok(Self {
            name: name.to_string(),
            sem,
            owner: false
        })
    }

    /// Latches the flag. Idempotent while already raised.
    pub fn raise(&self) -> Result<(), TransportError> {
        let mut value: libc::c_int = 0;

        // SAFETY: sem is a live handle for the lifetime of self.
        if unsafe { libc::sem_getvalue(self.sem, &mut value) } != 0 {
            return Err(TransportError::os("sem_getvalue"));
        }

        // Keep the semaphore binary so queued-up raises never accumulate;
        // auto-reset event semantics, not a counter.
        if value == 0 && unsafe { libc::sem_post(self.sem) } != 0 {
            return Err(TransportError::os("sem_post"));
        }

        Ok(())
    }

    /// Consumes one raise, waiting at most `timeout` for it.
    pub fn wait(&self, timeout: Duration) -> Result<(), TransportError> {
        let deadline = deadline_after(timeout)?;

        loop {
            // SAFETY: sem is a live handle; deadline is a valid timespec.
            if unsafe { libc::sem_timedwait(self.sem, &deadline) } == 0 {
                return Ok(());
            }

            let err = std::io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::EINTR) => continue,
                Some(libc::ETIMEDOUT) => {
                    return Err(TransportError::SignalTimeout {
                        name: self.name.clone()
                    });
                }
                _ => {
                    return Err(TransportError::Os {
                        operation: "sem_timedwait",
                        source: err
                    });
                }
            }
        }
    }
}

impl Drop for Signal {
    fn drop(&mut self) {
        // SAFETY: sem came from sem_open and is closed exactly once.
        unsafe {
            libc::sem_close(self.sem);
        }

        if self.owner {
            if let Ok(c_name) = to_c_name(&self.name) {
                // SAFETY: c_name is a valid NUL-terminated string.
                unsafe { libc::sem_unlink(c_name.as_ptr()) };
            }
        }
    }
}

fn to_c_name(name: &str) -> Result<CString, TransportError> {
    CString::new(name).map_err(|_| TransportError::Os {
        operation: "sem name",
        source: std::io::Error::from(std::io::ErrorKind::InvalidInput)
    })
}
