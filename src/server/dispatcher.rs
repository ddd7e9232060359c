use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info, trace, warn};

use crate::ledger::Ledger;
use crate::server::audit::AuditSink;
use crate::server::processors::{TransactionProcessor, TransferProcessor};
use crate::transport::{IDLE_WAIT, Mailbox, Signal, TransportConfig, TransportError};
use crate::wire::{RequestEnvelope, RequestKind, TransactionResponse, TransferResponse};

/// Last-resort reply emitted if even response serialization fails.
const FALLBACK_REPLY: &[u8] =
    br#"{"ResultStatus":"ServerError","Message":"Internal server error.","AccountNumber":""}"#;

/// Lets embedding code (tests, a shutdown hook) end the dispatcher loop.
/// The server binary never uses it; its loop runs until the process dies.
#[derive(Clone)]
pub struct DispatcherHandle {
    stop: Arc<AtomicBool>
}

impl DispatcherHandle {
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

/// The server loop: waits for `RequestReady`, reads the mailbox, routes the
/// envelope to a processor, writes the response back and raises
/// `ResponseReady`.
///
/// Exactly one request is processed end-to-end before the next wait, so all
/// ledger mutations are serialized by construction. Errors never escape the
/// loop; they are logged and the loop goes back to waiting.
pub struct RequestDispatcher {
    mailbox: Mailbox,
    request_ready: Signal,
    response_ready: Signal,
    transactions: TransactionProcessor,
    transfers: TransferProcessor,
    stop: Arc<AtomicBool>
}

impl RequestDispatcher {
    /// Creates the three named IPC resources and owns them for the process
    /// lifetime. Stale objects from a crashed previous run are replaced.
    pub fn bind(
        config: &TransportConfig,
        ledger: Arc<Ledger>,
        audit: Arc<dyn AuditSink>
    ) -> Result<Self, TransportError> {
        Ok(Self {
            mailbox: Mailbox::create(config)?,
            request_ready: Signal::create(&config.request_ready_name())?,
            response_ready: Signal::create(&config.response_ready_name())?,
            transactions: TransactionProcessor::new(Arc::clone(&ledger), Arc::clone(&audit)),
            transfers: TransferProcessor::new(ledger, audit),
            stop: Arc::new(AtomicBool::new(false))
        })
    }

    pub fn handle(&self) -> DispatcherHandle {
        DispatcherHandle {
            stop: Arc::clone(&self.stop)
        }
    }

    /// Runs until the handle is stopped. Blocking; callers give it a thread.
    pub fn run(&self) {
        info!("Dispatcher ready, waiting for requests");

        while !self.stop.load(Ordering::Relaxed) {
            match self.request_ready.wait(IDLE_WAIT) {
                Ok(()) => self.handle_request(),
                Err(TransportError::SignalTimeout { .. }) => continue,
                Err(err) => {
                    error!("Request signal wait failed: {err}");
                    continue;
                }
            }
        }

        info!("Dispatcher stopped");
    }

    fn handle_request(&self) {
        trace!("reading request");
        let payload = match self.mailbox.read() {
            Ok(payload) => payload,
            Err(err) => {
                error!("Mailbox read failed: {err}");
                return;
            }
        };

        // A raise with nothing behind it (or a sender that died between
        // signaling and writing); nothing to answer.
        if payload.is_empty() {
            debug!("Spurious wakeup: mailbox empty");
            return;
        }

        trace!("processing request");
        let reply = self.dispatch(&payload);

        trace!("writing response");
        if let Err(err) = self.mailbox.write(&reply) {
            error!("Mailbox write failed, client will time out: {err}");
            return;
        }

        trace!("raising response signal");
        if let Err(err) = self.response_ready.raise() {
            warn!("Could not raise response signal: {err}");
        }

        trace!("request complete");
    }

    /// Routes one envelope. Malformed requests get an explicit `ServerError`
    /// reply rather than a silent drop, so a well-behaved sender hears about
    /// its mistake instead of timing out.
    pub(crate) fn dispatch(&self, payload: &[u8]) -> Vec<u8> {
        let envelope = match RequestEnvelope::decode(payload) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!("Malformed request envelope: {err}");
                return encode_reply(&TransactionResponse::server_error("", "Malformed request."));
            }
        };

        match envelope.request_type {
            RequestKind::Transaction => match envelope.decode_transaction() {
                Ok(message) => {
                    debug!(
                        "Processing {:?} for account [{}]",
                        message.kind, message.account_number
                    );
                    encode_reply(&self.transactions.process(&message))
                }
                Err(err) => {
                    warn!("Malformed transaction payload: {err}");
                    encode_reply(&TransactionResponse::server_error("", "Malformed transaction payload."))
                }
            },
            RequestKind::Transfer => match envelope.decode_transfer() {
                Ok(message) => {
                    debug!(
                        "Processing transfer [{}] -> [{}]",
                        message.from_account_number, message.to_account_number
                    );
                    encode_reply(&self.transfers.process(&message))
                }
                Err(err) => {
                    warn!("Malformed transfer payload: {err}");
                    encode_reply(&TransferResponse::server_error("", "", "Malformed transfer payload."))
                }
            }
        }
    }
}

fn encode_reply<T: serde::Serialize>(response: &T) -> Vec<u8> {
    match crate::wire::to_bytes(response) {
        Ok(bytes) => bytes,
        Err(err) => {
            error!("Response serialization failed: {err}");
            FALLBACK_REPLY.to_vec()
        }
    }
}
