use thiserror::Error;
use tokio::task::spawn_blocking;
use tracing::debug;

use crate::transport::{MAILBOX_CAPACITY, Mailbox, Signal, TransportConfig, TransportError};
use crate::wire::{
    self, RequestEnvelope, TransactionMessage, TransactionResponse, TransferMessage, TransferResponse, WireError
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Wire(#[from] WireError)
}

/// Front-end side of the transport.
///
/// Every send is one full round trip: write the request into the mailbox,
/// raise `RequestReady`, wait (bounded) for `ResponseReady`, read the reply
/// back. All transport failures resolve locally into a `ServerError`-status
/// response; no failure mode panics or crosses the process boundary, and
/// nothing is retried automatically.
pub struct BankClient {
    config: TransportConfig
}

impl BankClient {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    pub async fn send_transaction(&self, request: TransactionMessage) -> TransactionResponse {
        let account = request.account_number.clone();
        let config = self.config.clone();

        let outcome = spawn_blocking(move || {
            let envelope = RequestEnvelope::transaction(&request)?;
            let reply = round_trip(&config, &envelope)?;
            Ok::<TransactionResponse, ClientError>(wire::from_bytes(&reply)?)
        })
        .await;

        match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => TransactionResponse::server_error(&account, describe(&err)),
            Err(join_err) => TransactionResponse::server_error(&account, format!("Client task failed: {join_err}"))
        }
    }

    pub async fn send_transfer(&self, request: TransferMessage) -> TransferResponse {
        let from = request.from_account_number.clone();
        let to = request.to_account_number.clone();
        let config = self.config.clone();

        let outcome = spawn_blocking(move || {
            let envelope = RequestEnvelope::transfer(&request)?;
            let reply = round_trip(&config, &envelope)?;
            Ok::<TransferResponse, ClientError>(wire::from_bytes(&reply)?)
        })
        .await;

        match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => TransferResponse::server_error(&from, &to, describe(&err)),
            Err(join_err) => TransferResponse::server_error(&from, &to, format!("Client task failed: {join_err}"))
        }
    }
}

impl Default for BankClient {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

/// One blocking request/response exchange over the shared mailbox.
fn round_trip(config: &TransportConfig, envelope: &RequestEnvelope) -> Result<Vec<u8>, ClientError> {
    let payload = envelope.encode()?;

    // Reject before any lock is taken or signal raised.
    if payload.len() > MAILBOX_CAPACITY {
        return Err(TransportError::OversizedPayload {
            size: payload.len(),
            capacity: MAILBOX_CAPACITY
        }
        .into());
    }

    // Opening everything up front doubles as the offline check: a missing
    // segment or signal means no server is running.
    let mailbox = Mailbox::open(config)?;
    let request_ready = Signal::open(&config.request_ready_name())?;
    let response_ready = Signal::open(&config.response_ready_name())?;

    mailbox.write(&payload)?;
    request_ready.raise()?;

    debug!("Request sent, awaiting response");
    response_ready.wait(config.response_timeout)?;

    Ok(mailbox.read()?)
}

/// Client-facing text for each transport failure.
fn describe(err: &ClientError) -> String {
    match err {
        ClientError::Transport(TransportError::LockTimeout) => "Queue Timeout".to_string(),
        ClientError::Transport(TransportError::SignalTimeout { .. }) => "Server Timeout".to_string(),
        ClientError::Transport(TransportError::ReceiverOffline { .. }) => "Bank server is offline.".to_string(),
        ClientError::Transport(TransportError::OversizedPayload { .. }) => {
            "Request is too large for shared memory.".to_string()
        }
        other => other.to_string()
    }
}
