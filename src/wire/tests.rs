use super::{RequestEnvelope, RequestKind, TransactionMessage, TransactionResponse, TransferMessage};

use std::str::FromStr;

use anyhow::Result;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::models::{TransactionKind, TransactionStatus};

#[test]
fn test_transaction_message_uses_pascal_case_field_names() -> Result<()> {
    let message = TransactionMessage::new(TransactionKind::Deposit, "1111", Decimal::from_str("250.00")?);

    let json: Value = serde_json::from_slice(&super::to_bytes(&message)?)?;

    assert_eq!(json["Type"], "Deposit");
    assert_eq!(json["AccountNumber"], "1111");
    assert!(json.get("Amount").is_some());
    assert!(json.get("Timestamp").is_some());

    Ok(())
}

#[test]
fn test_envelope_round_trip_preserves_the_inner_payload() -> Result<()> {
    let message = TransactionMessage::new(TransactionKind::Withdraw, "2222", Decimal::from_str("10.00")?);
    let envelope = RequestEnvelope::transaction(&message)?;

    let decoded = RequestEnvelope::decode(&envelope.encode()?)?;

    assert_eq!(decoded.request_type, RequestKind::Transaction);

    let inner = decoded.decode_transaction()?;
    assert_eq!(inner.account_number, "2222");
    assert_eq!(inner.amount, Decimal::from_str("10.00")?);

    Ok(())
}

#[test]
fn test_envelope_discriminator_is_peekable_without_decoding_the_body() -> Result<()> {
    let message = TransferMessage::new("1111", "2222", Decimal::from_str("100.00")?);
    let envelope = RequestEnvelope::transfer(&message)?;

    let json: Value = serde_json::from_slice(&envelope.encode()?)?;

    assert_eq!(json["RequestType"], "Transfer");
    // The body stays an encoded string until a processor asks for it.
    assert!(json["JsonPayload"].is_string());

    Ok(())
}

#[test]
fn test_decoding_garbage_is_an_error_not_a_panic() {
    assert!(RequestEnvelope::decode(b"not json at all").is_err());
    assert!(RequestEnvelope::decode(b"").is_err());
    assert!(RequestEnvelope::decode(br#"{"RequestType":"Nonsense","JsonPayload":"{}"}"#).is_err());
}

#[test]
fn test_envelope_with_mismatched_body_fails_on_inner_decode() -> Result<()> {
    let transfer = TransferMessage::new("1111", "2222", Decimal::ONE);
    let envelope = RequestEnvelope::transfer(&transfer)?;

    // Routing by the discriminator is the dispatcher's job; decoding the
    // wrong body type surfaces as a wire error.
    assert!(envelope.decode_transaction().is_err());

    Ok(())
}

#[test]
fn test_response_omits_balance_when_account_is_unknown() -> Result<()> {
    let response = TransactionResponse::failure("9999", TransactionStatus::AccountNotFound, "Account not found.", None);

    let json: Value = serde_json::from_slice(&super::to_bytes(&response)?)?;

    assert_eq!(json["ResultStatus"], "AccountNotFound");
    assert!(json.get("NewBalance").is_none());

    Ok(())
}

#[test]
fn test_response_round_trip() -> Result<()> {
    let response = TransactionResponse::success("1111", "Deposit of 250.00 successful.", Decimal::from_str("1250.00")?);

    let decoded: TransactionResponse = super::from_bytes(&super::to_bytes(&response)?)?;

    assert_eq!(decoded.status, TransactionStatus::Success);
    assert_eq!(decoded.new_balance, Some(Decimal::from_str("1250.00")?));
    assert!(decoded.history.is_empty());

    Ok(())
}
