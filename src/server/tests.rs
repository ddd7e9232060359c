use super::{
    AuditSink, DiscardAuditSink, FileAuditSink, RequestDispatcher, TransactionProcessor, TransferProcessor
};

use std::fs;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::ledger::{Ledger, default_seed};
use crate::models::{TransactionKind, TransactionStatus};
use crate::transport::TransportConfig;
use crate::wire::{self, RequestEnvelope, TransactionMessage, TransactionResponse, TransferMessage, TransferResponse};

fn seeded_ledger() -> Arc<Ledger> {
    let ledger = Ledger::new();
    ledger.seed(default_seed());
    Arc::new(ledger)
}

fn dec(value: &str) -> Result<Decimal> {
    Ok(Decimal::from_str(value)?)
}

/// Collects audit lines in memory so tests can assert on them.
struct RecordingSink {
    lines: Mutex<Vec<String>>
}

impl RecordingSink {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            lines: Mutex::new(Vec::new())
        })
    }

    fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|lines| lines.clone()).unwrap_or_default()
    }
}

impl AuditSink for RecordingSink {
    fn append(&self, _timestamp: DateTime<Utc>, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(message.to_string());
        }
    }
}

fn transaction_processor(ledger: Arc<Ledger>) -> TransactionProcessor {
    TransactionProcessor::new(ledger, Arc::new(DiscardAuditSink))
}

fn transfer_processor(ledger: Arc<Ledger>) -> TransferProcessor {
    TransferProcessor::new(ledger, Arc::new(DiscardAuditSink))
}

#[test]
fn test_deposit_increases_balance_and_returns_success() -> Result<()> {
    let processor = transaction_processor(seeded_ledger());
    let request = TransactionMessage::new(TransactionKind::Deposit, "1111", dec("250.00")?);

    let response = processor.process(&request);

    assert_eq!(response.status, TransactionStatus::Success);
    assert_eq!(response.new_balance, Some(dec("1250.00")?));

    Ok(())
}

#[test]
fn test_deposit_overflowing_the_balance_fails_cleanly() -> Result<()> {
    let ledger = seeded_ledger();
    let processor = transaction_processor(Arc::clone(&ledger));
    // The largest representable amount passes the positive-amount check but
    // cannot be added to any non-zero balance.
    let request = TransactionMessage::new(TransactionKind::Deposit, "1111", Decimal::MAX);

    let response = processor.process(&request);

    assert_eq!(response.status, TransactionStatus::ServerError);
    assert_eq!(ledger.balance("1111")?, dec("1000.00")?);

    Ok(())
}

#[test]
fn test_overdraw_reports_insufficient_funds_with_unchanged_balance() -> Result<()> {
    let ledger = seeded_ledger();
    let processor = transaction_processor(Arc::clone(&ledger));
    let request = TransactionMessage::new(TransactionKind::Withdraw, "2222", dec("501.00")?);

    let response = processor.process(&request);

    assert_eq!(response.status, TransactionStatus::InsufficientFunds);
    assert_eq!(response.new_balance, Some(dec("500.50")?));
    assert_eq!(ledger.balance("2222")?, dec("500.50")?);

    Ok(())
}

#[test]
fn test_unknown_account_reports_not_found_without_a_balance() -> Result<()> {
    let processor = transaction_processor(seeded_ledger());
    let request = TransactionMessage::new(TransactionKind::Deposit, "9999", dec("10.00")?);

    let response = processor.process(&request);

    assert_eq!(response.status, TransactionStatus::AccountNotFound);
    assert_eq!(response.new_balance, None);

    Ok(())
}

#[test]
fn test_account_lookup_precedes_amount_validation() -> Result<()> {
    let processor = transaction_processor(seeded_ledger());
    let request = TransactionMessage::new(TransactionKind::Deposit, "9999", Decimal::ZERO);

    let response = processor.process(&request);

    assert_eq!(response.status, TransactionStatus::AccountNotFound);

    Ok(())
}

#[test]
fn test_zero_deposit_is_an_invalid_amount() -> Result<()> {
    let ledger = seeded_ledger();
    let processor = transaction_processor(Arc::clone(&ledger));
    let request = TransactionMessage::new(TransactionKind::Deposit, "1111", dec("0.00")?);

    let response = processor.process(&request);

    assert_eq!(response.status, TransactionStatus::InvalidAmount);
    assert_eq!(ledger.balance("1111")?, dec("1000.00")?);

    Ok(())
}

#[test]
fn test_negative_withdrawal_is_an_invalid_amount() -> Result<()> {
    let processor = transaction_processor(seeded_ledger());
    let request = TransactionMessage::new(TransactionKind::Withdraw, "1111", dec("-5.00")?);

    let response = processor.process(&request);

    assert_eq!(response.status, TransactionStatus::InvalidAmount);

    Ok(())
}

#[test]
fn test_check_balance_mutates_nothing_and_carries_history() -> Result<()> {
    let ledger = seeded_ledger();
    ledger.credit("1111", dec("10.00")?)?;
    ledger.credit("1111", dec("20.00")?)?;

    let processor = transaction_processor(Arc::clone(&ledger));
    let request = TransactionMessage::new(TransactionKind::CheckBalance, "1111", Decimal::ZERO);

    let response = processor.process(&request);

    assert_eq!(response.status, TransactionStatus::Success);
    assert_eq!(response.new_balance, Some(dec("1030.00")?));
    assert_eq!(response.history.len(), 2);
    // The zero amount is fine for an inquiry, and nothing was recorded.
    assert_eq!(ledger.history("1111", 50)?.len(), 2);

    Ok(())
}

#[test]
fn test_transfer_happy_path_carries_both_new_balances() -> Result<()> {
    let processor = transfer_processor(seeded_ledger());
    let request = TransferMessage::new("1111", "2222", dec("100.00")?);

    let response = processor.process(&request);

    assert_eq!(response.status, TransactionStatus::Success);
    assert_eq!(response.from_account_new_balance, Some(dec("900.00")?));
    assert_eq!(response.to_account_new_balance, Some(dec("600.50")?));

    Ok(())
}

#[test]
fn test_transfer_amount_validation_precedes_account_checks() -> Result<()> {
    let processor = transfer_processor(seeded_ledger());
    let request = TransferMessage::new("9999", "8888", Decimal::ZERO);

    let response = processor.process(&request);

    assert_eq!(response.status, TransactionStatus::InvalidAmount);

    Ok(())
}

#[test]
fn test_transfer_to_the_same_account_is_a_server_error() -> Result<()> {
    let processor = transfer_processor(seeded_ledger());
    let request = TransferMessage::new("1111", "1111", dec("10.00")?);

    let response = processor.process(&request);

    assert_eq!(response.status, TransactionStatus::ServerError);
    assert_eq!(response.message, "Cannot transfer to the same account.");

    Ok(())
}

#[test]
fn test_transfer_from_missing_source_names_the_source() -> Result<()> {
    let processor = transfer_processor(seeded_ledger());
    let request = TransferMessage::new("9999", "2222", dec("10.00")?);

    let response = processor.process(&request);

    assert_eq!(response.status, TransactionStatus::AccountNotFound);
    assert_eq!(response.message, "Source account not found.");

    Ok(())
}

#[test]
fn test_transfer_to_missing_destination_names_the_destination() -> Result<()> {
    let processor = transfer_processor(seeded_ledger());
    let request = TransferMessage::new("1111", "9999", dec("10.00")?);

    let response = processor.process(&request);

    assert_eq!(response.status, TransactionStatus::AccountNotFound);
    assert_eq!(response.message, "Destination account not found.");

    Ok(())
}

#[test]
fn test_underfunded_transfer_reports_both_unchanged_balances() -> Result<()> {
    let ledger = seeded_ledger();
    let processor = transfer_processor(Arc::clone(&ledger));
    let request = TransferMessage::new("2222", "1111", dec("501.00")?);

    let response = processor.process(&request);

    assert_eq!(response.status, TransactionStatus::InsufficientFunds);
    assert_eq!(response.from_account_new_balance, Some(dec("500.50")?));
    assert_eq!(response.to_account_new_balance, Some(dec("1000.00")?));
    assert_eq!(ledger.balance("2222")?, dec("500.50")?);
    assert_eq!(ledger.balance("1111")?, dec("1000.00")?);

    Ok(())
}

#[test]
fn test_every_processor_branch_leaves_an_audit_line() -> Result<()> {
    let sink = RecordingSink::new();
    let ledger = seeded_ledger();
    let processor = TransactionProcessor::new(ledger, Arc::clone(&sink) as Arc<dyn AuditSink>);

    processor.process(&TransactionMessage::new(TransactionKind::Deposit, "1111", dec("1.00")?));
    processor.process(&TransactionMessage::new(TransactionKind::Withdraw, "2222", dec("9999.00")?));
    processor.process(&TransactionMessage::new(TransactionKind::Deposit, "9999", dec("1.00")?));

    let lines = sink.lines();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("SUCCESS:"));
    assert!(lines[1].contains("Insufficient Funds"));
    assert!(lines[2].contains("not found"));

    Ok(())
}

#[test]
fn test_file_audit_sink_writes_one_json_object_per_line() -> Result<()> {
    let file = NamedTempFile::new()?;
    let sink = FileAuditSink::new(file.path())?;

    sink.append(Utc::now(), "SUCCESS: Deposit 1.00 to 1111");
    sink.append(Utc::now(), "FAILED: Account 9999 not found");

    let contents = fs::read_to_string(file.path())?;
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: Value = serde_json::from_str(lines[0])?;
    assert_eq!(first["Message"], "SUCCESS: Deposit 1.00 to 1111");
    assert!(first.get("Timestamp").is_some());

    Ok(())
}

fn test_dispatcher(namespace: &str) -> Result<RequestDispatcher> {
    let config = TransportConfig::new(format!(
        "{namespace}-{}-{:08x}",
        std::process::id(),
        rand::random::<u32>()
    ));
    Ok(RequestDispatcher::bind(&config, seeded_ledger(), Arc::new(DiscardAuditSink))?)
}

#[test]
fn test_dispatcher_routes_a_transaction_envelope() -> Result<()> {
    let dispatcher = test_dispatcher("dispatch-txn")?;
    let envelope = RequestEnvelope::transaction(&TransactionMessage::new(
        TransactionKind::Deposit,
        "1111",
        dec("250.00")?
    ))?;

    let reply = dispatcher.dispatch(&envelope.encode()?);
    let response: TransactionResponse = wire::from_bytes(&reply)?;

    assert_eq!(response.status, TransactionStatus::Success);
    assert_eq!(response.new_balance, Some(dec("1250.00")?));

    Ok(())
}

#[test]
fn test_dispatcher_routes_a_transfer_envelope() -> Result<()> {
    let dispatcher = test_dispatcher("dispatch-tfr")?;
    let envelope = RequestEnvelope::transfer(&TransferMessage::new("1111", "2222", dec("100.00")?))?;

    let reply = dispatcher.dispatch(&envelope.encode()?);
    let response: TransferResponse = wire::from_bytes(&reply)?;

    assert_eq!(response.status, TransactionStatus::Success);

    Ok(())
}

#[test]
fn test_dispatcher_survives_an_overflowing_deposit() -> Result<()> {
    let dispatcher = test_dispatcher("dispatch-overflow")?;
    let envelope = RequestEnvelope::transaction(&TransactionMessage::new(
        TransactionKind::Deposit,
        "1111",
        Decimal::MAX
    ))?;

    let reply = dispatcher.dispatch(&envelope.encode()?);
    let response: TransactionResponse = wire::from_bytes(&reply)?;

    assert_eq!(response.status, TransactionStatus::ServerError);
    assert_eq!(response.message, "Balance limit exceeded.");

    Ok(())
}

#[test]
fn test_dispatcher_answers_malformed_requests_with_a_server_error() -> Result<()> {
    let dispatcher = test_dispatcher("dispatch-bad")?;

    let reply = dispatcher.dispatch(b"this is not an envelope");
    let response: TransactionResponse = wire::from_bytes(&reply)?;

    assert_eq!(response.status, TransactionStatus::ServerError);
    assert_eq!(response.message, "Malformed request.");

    Ok(())
}

#[test]
fn test_dispatcher_answers_mismatched_bodies_with_a_server_error() -> Result<()> {
    let dispatcher = test_dispatcher("dispatch-mismatch")?;
    let envelope = RequestEnvelope {
        request_type: crate::wire::RequestKind::Transaction,
        json_payload: "{\"garbage\":true}".to_string()
    };

    let reply = dispatcher.dispatch(&envelope.encode()?);
    let response: TransactionResponse = wire::from_bytes(&reply)?;

    assert_eq!(response.status, TransactionStatus::ServerError);

    Ok(())
}
