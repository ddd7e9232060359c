mod audit;
mod dispatcher;
mod processors;
#[cfg(test)]
mod tests;

pub use audit::{AuditSink, DiscardAuditSink, FileAuditSink};
pub use dispatcher::{DispatcherHandle, RequestDispatcher};
pub use processors::{TransactionProcessor, TransferProcessor};
