use serde::{Deserialize, Serialize};

use crate::wire::errors::WireError;
use crate::wire::messages::{TransactionMessage, TransferMessage};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum RequestKind {
    Transaction,
    Transfer
}

/// Outer envelope carried in the mailbox.
///
/// The inner message stays encoded so the dispatcher can peek the
/// discriminator and route the request before decoding the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    #[serde(rename = "RequestType")]
    pub request_type: RequestKind,
    #[serde(rename = "JsonPayload")]
    pub json_payload: String
}

impl RequestEnvelope {
    pub fn transaction(message: &TransactionMessage) -> Result<Self, WireError> {
        Ok(Self {
            request_type: RequestKind::Transaction,
            json_payload: serde_json::to_string(message)?
        })
    }

    pub fn transfer(message: &TransferMessage) -> Result<Self, WireError> {
        Ok(Self {
            request_type: RequestKind::Transfer,
            json_payload: serde_json::to_string(message)?
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn decode_transaction(&self) -> Result<TransactionMessage, WireError> {
        Ok(serde_json::from_str(&self.json_payload)?)
    }

    pub fn decode_transfer(&self) -> Result<TransferMessage, WireError> {
        Ok(serde_json::from_str(&self.json_payload)?)
    }
}
