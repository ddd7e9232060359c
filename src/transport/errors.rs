use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Payload of {size} bytes exceeds the {capacity}-byte mailbox")]
    OversizedPayload {
        size: usize,
        capacity: usize
    },
    #[error("Timed out acquiring the mailbox lock")]
    LockTimeout,
    #[error("Timed out waiting on signal [{name}]")]
    SignalTimeout {
        name: String
    },
    #[error("Receiver offline: [{name}] does not exist")]
    ReceiverOffline {
        name: String
    },
    #[error("OS error in {operation}: {source}")]
    Os {
        operation: &'static str,
        source: io::Error
    }
}

impl TransportError {
    /// Captures `errno` for a failed libc call.
    pub fn os(operation: &'static str) -> Self {
        Self::Os {
            operation,
            source: io::Error::last_os_error()
        }
    }

    /// Wraps a pthread-style return code, which is an error number rather
    /// than an errno set as a side effect.
    pub fn os_code(operation: &'static str, code: i32) -> Self {
        Self::Os {
            operation,
            source: io::Error::from_raw_os_error(code)
        }
    }

    pub fn receiver_offline(name: &str) -> Self {
        Self::ReceiverOffline {
            name: name.to_string()
        }
    }
}
