mod envelope;
mod errors;
mod messages;
#[cfg(test)]
mod tests;

pub use envelope::{RequestEnvelope, RequestKind};
pub use errors::WireError;
pub use messages::{TransactionMessage, TransactionResponse, TransferMessage, TransferResponse};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Encodes a message as UTF-8 JSON, ready for the mailbox.
pub fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, WireError> {
    Ok(serde_json::to_vec(value)?)
}

/// Decodes a message read back from the mailbox.
pub fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    Ok(serde_json::from_slice(bytes)?)
}
