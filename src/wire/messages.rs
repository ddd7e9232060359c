use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{HistoryEntry, TransactionKind, TransactionStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionMessage {
    #[serde(rename = "Type")]
    pub kind: TransactionKind,
    #[serde(rename = "AccountNumber")]
    pub account_number: String,
    #[serde(rename = "Amount")]
    pub amount: Decimal,
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>
}

impl TransactionMessage {
    pub fn new(kind: TransactionKind, account_number: impl Into<String>, amount: Decimal) -> Self {
        Self {
            kind,
            account_number: account_number.into(),
            amount,
            timestamp: Utc::now()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferMessage {
    #[serde(rename = "FromAccountNumber")]
    pub from_account_number: String,
    #[serde(rename = "ToAccountNumber")]
    pub to_account_number: String,
    #[serde(rename = "Amount")]
    pub amount: Decimal,
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>
}

impl TransferMessage {
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: Decimal) -> Self {
        Self {
            from_account_number: from.into(),
            to_account_number: to.into(),
            amount,
            timestamp: Utc::now()
        }
    }
}

/// Server reply to a [`TransactionMessage`].
///
/// `new_balance` is `None` when the account could not be found: the server
/// has no balance to report in that case. `history` is only populated for
/// balance inquiries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResponse {
    #[serde(rename = "ResultStatus")]
    pub status: TransactionStatus,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "NewBalance", default, skip_serializing_if = "Option::is_none")]
    pub new_balance: Option<Decimal>,
    #[serde(rename = "AccountNumber")]
    pub account_number: String,
    #[serde(rename = "History", default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>
}

impl TransactionResponse {
    pub fn success(account_number: &str, message: impl Into<String>, new_balance: Decimal) -> Self {
        Self {
            status: TransactionStatus::Success,
            message: message.into(),
            new_balance: Some(new_balance),
            account_number: account_number.to_string(),
            history: Vec::new()
        }
    }

    pub fn failure(account_number: &str, status: TransactionStatus, message: impl Into<String>, balance: Option<Decimal>) -> Self {
        Self {
            status,
            message: message.into(),
            new_balance: balance,
            account_number: account_number.to_string(),
            history: Vec::new()
        }
    }

    pub fn server_error(account_number: &str, message: impl Into<String>) -> Self {
        Self::failure(account_number, TransactionStatus::ServerError, message, None)
    }
}

/// Server reply to a [`TransferMessage`]. Balances are reported unchanged on
/// every failure path, and absent when the relevant account was not found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResponse {
    #[serde(rename = "ResultStatus")]
    pub status: TransactionStatus,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "FromAccountNewBalance", default, skip_serializing_if = "Option::is_none")]
    pub from_account_new_balance: Option<Decimal>,
    #[serde(rename = "ToAccountNewBalance", default, skip_serializing_if = "Option::is_none")]
    pub to_account_new_balance: Option<Decimal>,
    #[serde(rename = "FromAccountNumber")]
    pub from_account_number: String,
    #[serde(rename = "ToAccountNumber")]
    pub to_account_number: String
}

impl TransferResponse {
    pub fn success(from: &str, to: &str, message: impl Into<String>, from_balance: Decimal, to_balance: Decimal) -> Self {
        Self {
            status: TransactionStatus::Success,
            message: message.into(),
            from_account_new_balance: Some(from_balance),
            to_account_new_balance: Some(to_balance),
            from_account_number: from.to_string(),
            to_account_number: to.to_string()
        }
    }

    pub fn failure(from: &str, to: &str, status: TransactionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            from_account_new_balance: None,
            to_account_new_balance: None,
            from_account_number: from.to_string(),
            to_account_number: to.to_string()
        }
    }

    pub fn server_error(from: &str, to: &str, message: impl Into<String>) -> Self {
        Self::failure(from, to, TransactionStatus::ServerError, message)
    }
}
