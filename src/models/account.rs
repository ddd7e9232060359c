use std::collections::VecDeque;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::models::errors::AccountError;
use crate::models::{HistoryEntry, TransactionKind, TransactionStatus};

/// Maximum number of history entries retained per account. The oldest entry
/// is evicted once the cap is exceeded.
pub const HISTORY_CAP: usize = 100;

/// Default number of history entries returned in a balance snapshot.
pub const HISTORY_SNAPSHOT: usize = 50;

/// A single bank account owned exclusively by the ledger.
///
/// The balance is never negative: `debit` refuses to overdraw and leaves the
/// balance untouched on failure. Successful operations and failed debits are
/// recorded in the bounded history, newest first; an overflowing credit is
/// rejected without touching balance or history.
#[derive(Debug, Clone)]
pub struct Account {
    /// The unique account identifier ("1111", "2222", ...).
    pub account_number: String,
    /// Display name of the account holder.
    pub owner_name: String,
    balance: Decimal,
    history: VecDeque<HistoryEntry>
}

impl Account {
    pub fn new(account_number: impl Into<String>, owner_name: impl Into<String>, initial_balance: Decimal) -> Self {
        Self {
            account_number: account_number.into(),
            owner_name: owner_name.into(),
            balance: initial_balance,
            history: VecDeque::new()
        }
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Increases the balance and records a successful entry.
    ///
    /// Amount validation happens at the processor layer before the ledger is
    /// touched; the only failure here is a balance that would no longer fit
    /// in a `Decimal`, which leaves the account untouched.
    pub fn credit(&mut self, amount: Decimal) -> Result<Decimal, AccountError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| AccountError::overflow(&self.account_number))?;
        self.record(TransactionKind::Deposit, amount, TransactionStatus::Success);

        Ok(self.balance)
    }

    /// Decreases the balance if the funds cover the amount.
    ///
    /// On insufficient funds the balance is left untouched and a failed
    /// history entry is still recorded, mirroring the audit trail of the
    /// successful path.
    pub fn debit(&mut self, amount: Decimal) -> Result<Decimal, AccountError> {
        if self.balance < amount {
            self.record(TransactionKind::Withdraw, amount, TransactionStatus::InsufficientFunds);
            return Err(AccountError::insufficient_funds(&self.account_number, self.balance, amount));
        }

        // A negative amount slips past the funds check and would grow the
        // balance, so subtraction stays checked as well.
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or_else(|| AccountError::overflow(&self.account_number))?;
        self.record(TransactionKind::Withdraw, amount, TransactionStatus::Success);

        Ok(self.balance)
    }

    /// Returns up to `max` history entries, newest first.
    pub fn history(&self, max: usize) -> Vec<HistoryEntry> {
        self.history.iter().take(max).cloned().collect()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn record(&mut self, kind: TransactionKind, amount: Decimal, status: TransactionStatus) {
        self.history.push_front(HistoryEntry {
            timestamp: Utc::now(),
            kind,
            amount,
            balance_after: self.balance,
            status,
            account_number: self.account_number.clone()
        });

        if self.history.len() > HISTORY_CAP {
            self.history.pop_back();
        }
    }
}
