mod account;
mod errors;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use account::{Account, HISTORY_CAP, HISTORY_SNAPSHOT};
pub use errors::AccountError;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum TransactionKind {
    Deposit,
    Withdraw,
    CheckBalance
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Success,
    AccountNotFound,
    InvalidAmount,
    InsufficientFunds,
    ServerError
}

/// One line of an account's bounded history. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "Type")]
    pub kind: TransactionKind,
    #[serde(rename = "Amount")]
    pub amount: Decimal,
    #[serde(rename = "BalanceAfter")]
    pub balance_after: Decimal,
    #[serde(rename = "Status")]
    pub status: TransactionStatus,
    #[serde(rename = "AccountNumber")]
    pub account_number: String
}
