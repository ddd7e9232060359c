use std::time::Duration;

/// Fixed size of the shared mailbox buffer, in bytes, for the whole process
/// lifetime.
pub const MAILBOX_CAPACITY: usize = 4096;

/// Bounded wait for the cross-process mailbox lock.
pub const LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounded wait for the server's response signal.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Granularity at which the server loop re-checks its stop flag while idle.
pub const IDLE_WAIT: Duration = Duration::from_secs(1);

/// Names and timeouts for one set of IPC resources.
///
/// All four named resources (mailbox segment, its embedded lock, and the two
/// signals) are derived from a single namespace so that independent
/// deployments, and tests in particular, never collide.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub namespace: String,
    pub lock_timeout: Duration,
    pub response_timeout: Duration
}

impl TransportConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            lock_timeout: LOCK_TIMEOUT,
            response_timeout: RESPONSE_TIMEOUT
        }
    }

    /// POSIX name of the shared memory object holding lock + buffer.
    pub fn mailbox_name(&self) -> String {
        format!("/{}.mailbox", self.namespace)
    }

    /// POSIX name of the sender -> receiver notification semaphore.
    pub fn request_ready_name(&self) -> String {
        format!("/{}.request-ready", self.namespace)
    }

    /// POSIX name of the receiver -> sender notification semaphore.
    pub fn response_ready_name(&self) -> String {
        format!("/{}.response-ready", self.namespace)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new("shm-bank")
    }
}
