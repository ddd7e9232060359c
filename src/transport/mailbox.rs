use std::ptr;
use std::time::Duration;

use crate::transport::lock::AccessLock;
use crate::transport::segment::SharedSegment;
use crate::transport::{MAILBOX_CAPACITY, TransportConfig, TransportError};

/// The single-slot shared buffer both processes exchange messages through.
///
/// There is no queue and no length prefix: the buffer holds exactly one
/// logical message, zero-padded to capacity, and boundaries rely entirely on
/// that padding. A payload containing an embedded zero byte is therefore
/// unsupported (JSON text never produces one). Each `write` and `read` takes
/// the embedded [`AccessLock`] for just that operation; the lock is never
/// held across a full round trip.
///
/// Because there is one slot, a second sender can overwrite a request the
/// server has not read yet. That lost-update hazard is a known property of
/// the single-slot protocol; callers that need ordering must serialize
/// their own sends.
pub struct Mailbox {
    segment: SharedSegment,
    lock_timeout: Duration
}

impl Mailbox {
    /// Creates the named segment and becomes its owner. Server side.
    pub fn create(config: &TransportConfig) -> Result<Self, TransportError> {
        Ok(Self {
            segment: SharedSegment::create(&config.mailbox_name(), MAILBOX_CAPACITY)?,
            lock_timeout: config.lock_timeout
        })
    }

    /// Opens an existing segment. Client side; fails with `ReceiverOffline`
    /// when no server has created it.
    pub fn open(config: &TransportConfig) -> Result<Self, TransportError> {
        Ok(Self {
            segment: SharedSegment::open(&config.mailbox_name(), MAILBOX_CAPACITY)?,
            lock_timeout: config.lock_timeout
        })
    }

    pub fn capacity(&self) -> usize {
        self.segment.capacity()
    }

    /// Places one message in the slot, replacing whatever was there.
    ///
    /// Oversized payloads are rejected before the lock is touched. The whole
    /// buffer is zero-filled first so a shorter message never leaves stale
    /// trailing bytes from a longer predecessor.
    pub fn write(&self, payload: &[u8]) -> Result<(), TransportError> {
        let capacity = self.segment.capacity();
        if payload.len() > capacity {
            return Err(TransportError::OversizedPayload {
                size: payload.len(),
                capacity
            });
        }

        let lock = AccessLock::new(self.segment.lock_ptr());
        let _guard = lock.acquire(self.lock_timeout)?;

        // SAFETY: the buffer is `capacity` bytes, we hold the cross-process
        // lock, and payload.len() <= capacity was checked above.
        unsafe {
            let buffer = self.segment.buffer_ptr();
            ptr::write_bytes(buffer, 0, capacity);
            ptr::copy_nonoverlapping(payload.as_ptr(), buffer, payload.len());
        }

        Ok(())
    }

    /// Copies the current message out of the slot, trimmed at the first zero
    /// byte. An untouched (all-zero) slot reads back as empty.
    pub fn read(&self) -> Result<Vec<u8>, TransportError> {
        let capacity = self.segment.capacity();
        let mut contents = vec![0u8; capacity];

        {
            let lock = AccessLock::new(self.segment.lock_ptr());
            let _guard = lock.acquire(self.lock_timeout)?;

            // SAFETY: same mapping bounds as in write(), lock held.
            unsafe {
                ptr::copy_nonoverlapping(self.segment.buffer_ptr(), contents.as_mut_ptr(), capacity);
            }
        }

        if let Some(end) = contents.iter().position(|byte| *byte == 0) {
            contents.truncate(end);
        }

        Ok(contents)
    }
}
