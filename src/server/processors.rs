use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::ledger::{Ledger, LedgerError};
use crate::models::{HISTORY_SNAPSHOT, TransactionKind, TransactionStatus};
use crate::server::audit::AuditSink;
use crate::wire::{TransactionMessage, TransactionResponse, TransferMessage, TransferResponse};

/// Business rules for single-account operations.
///
/// Checks run in a fixed order: account lookup, balance-inquiry
/// short-circuit, amount validation, then the mutation. Every branch leaves
/// one audit line behind, fire-and-forget.
pub struct TransactionProcessor {
    ledger: Arc<Ledger>,
    audit: Arc<dyn AuditSink>
}

impl TransactionProcessor {
    pub fn new(ledger: Arc<Ledger>, audit: Arc<dyn AuditSink>) -> Self {
        Self { ledger, audit }
    }

    pub fn process(&self, request: &TransactionMessage) -> TransactionResponse {
        let account = &request.account_number;

        let balance = match self.ledger.balance(account) {
            Ok(balance) => balance,
            Err(_) => {
                self.audit(format!("FAILED: Account {account} not found"));
                return TransactionResponse::failure(
                    account,
                    TransactionStatus::AccountNotFound,
                    "Account not found.",
                    None
                );
            }
        };

        if request.kind == TransactionKind::CheckBalance {
            self.audit(format!("SUCCESS: Balance inquiry for {account}. Balance: {balance}"));
            let mut response = TransactionResponse::success(account, "Balance inquiry successful.", balance);
            response.history = self.ledger.history(account, HISTORY_SNAPSHOT).unwrap_or_default();
            return response;
        }

        if request.amount <= Decimal::ZERO {
            self.audit(format!("FAILED: Invalid amount {} for {account}", request.amount));
            return TransactionResponse::failure(
                account,
                TransactionStatus::InvalidAmount,
                "Amount must be greater than zero.",
                Some(balance)
            );
        }

        if request.kind == TransactionKind::Deposit {
            let new_balance = match self.ledger.credit(account, request.amount) {
                Ok(new_balance) => new_balance,
                Err(LedgerError::BalanceOverflow { .. }) => {
                    self.audit(format!(
                        "FAILED: Deposit {} to {account} - Balance limit exceeded",
                        request.amount
                    ));
                    return TransactionResponse::server_error(account, "Balance limit exceeded.");
                }
                Err(_) => {
                    // The account vanished between lookup and mutation;
                    // cannot happen while accounts are never deleted.
                    return TransactionResponse::server_error(account, "Account disappeared mid-request.");
                }
            };

            self.audit(format!(
                "SUCCESS: Deposit {} to {account}. New balance: {new_balance}",
                request.amount
            ));
            return TransactionResponse::success(
                account,
                format!("Deposit of {} successful.", request.amount),
                new_balance
            );
        }

        match self.ledger.debit(account, request.amount) {
            Ok(new_balance) => {
                self.audit(format!(
                    "SUCCESS: Withdrawal {} from {account}. New balance: {new_balance}",
                    request.amount
                ));
                TransactionResponse::success(
                    account,
                    format!("Withdrawal of {} successful.", request.amount),
                    new_balance
                )
            }
            Err(LedgerError::InsufficientFunds { balance, .. }) => {
                self.audit(format!(
                    "FAILED: Withdrawal {} from {account} - Insufficient Funds",
                    request.amount
                ));
                TransactionResponse::failure(
                    account,
                    TransactionStatus::InsufficientFunds,
                    "Insufficient funds.",
                    Some(balance)
                )
            }
            Err(LedgerError::BalanceOverflow { .. }) => {
                self.audit(format!(
                    "FAILED: Withdrawal {} from {account} - Balance limit exceeded",
                    request.amount
                ));
                TransactionResponse::server_error(account, "Balance limit exceeded.")
            }
            Err(LedgerError::AccountNotFound { .. }) => {
                TransactionResponse::server_error(account, "Account disappeared mid-request.")
            }
        }
    }

    fn audit(&self, message: String) {
        self.audit.append(Utc::now(), &message);
    }
}

/// Business rules for two-account transfers.
///
/// Validation order: amount, distinct accounts, source exists, destination
/// exists, sufficient funds. The ledger performs the debit+credit pair with
/// rollback, so a successful response always satisfies the conservation
/// invariant and a failed one changes neither balance.
pub struct TransferProcessor {
    ledger: Arc<Ledger>,
    audit: Arc<dyn AuditSink>
}

impl TransferProcessor {
    pub fn new(ledger: Arc<Ledger>, audit: Arc<dyn AuditSink>) -> Self {
        Self { ledger, audit }
    }

    pub fn process(&self, request: &TransferMessage) -> TransferResponse {
        let from = &request.from_account_number;
        let to = &request.to_account_number;

        if request.amount <= Decimal::ZERO {
            self.audit(format!("FAILED: Invalid transfer amount {}", request.amount));
            return TransferResponse::failure(
                from,
                to,
                TransactionStatus::InvalidAmount,
                "Amount must be greater than zero."
            );
        }

        if from == to {
            self.audit(format!("FAILED: Transfer to same account {from}"));
            return TransferResponse::server_error(from, to, "Cannot transfer to the same account.");
        }

        let from_balance = match self.ledger.balance(from) {
            Ok(balance) => balance,
            Err(_) => {
                self.audit(format!("FAILED: Source account {from} not found"));
                return TransferResponse::failure(
                    from,
                    to,
                    TransactionStatus::AccountNotFound,
                    "Source account not found."
                );
            }
        };

        let to_balance = match self.ledger.balance(to) {
            Ok(balance) => balance,
            Err(_) => {
                self.audit(format!("FAILED: Destination account {to} not found"));
                return TransferResponse::failure(
                    from,
                    to,
                    TransactionStatus::AccountNotFound,
                    "Destination account not found."
                );
            }
        };

        if from_balance < request.amount {
            self.audit(format!(
                "FAILED: Transfer of {} from {from} - Insufficient Funds",
                request.amount
            ));
            let mut response = TransferResponse::failure(
                from,
                to,
                TransactionStatus::InsufficientFunds,
                "Insufficient funds for transfer."
            );
            response.from_account_new_balance = Some(from_balance);
            response.to_account_new_balance = Some(to_balance);
            return response;
        }

        match self.ledger.transfer(from, to, request.amount) {
            Ok((new_from, new_to)) => {
                self.audit(format!(
                    "SUCCESS: Transfer {} from {from} to {to}. From: {new_from}, To: {new_to}",
                    request.amount
                ));
                TransferResponse::success(
                    from,
                    to,
                    format!("Transfer of {} successful.", request.amount),
                    new_from,
                    new_to
                )
            }
            Err(LedgerError::InsufficientFunds { .. }) => {
                // Pre-checked above; only reachable if another thread raced
                // the balance down between check and transfer.
                let mut response = TransferResponse::failure(
                    from,
                    to,
                    TransactionStatus::InsufficientFunds,
                    "Insufficient funds for transfer."
                );
                response.from_account_new_balance = self.ledger.balance(from).ok();
                response.to_account_new_balance = self.ledger.balance(to).ok();
                response
            }
            Err(LedgerError::BalanceOverflow { .. }) => {
                self.audit(format!(
                    "FAILED: Transfer {} from {from} to {to} - Balance limit exceeded",
                    request.amount
                ));
                let mut response = TransferResponse::server_error(from, to, "Balance limit exceeded.");
                response.from_account_new_balance = self.ledger.balance(from).ok();
                response.to_account_new_balance = self.ledger.balance(to).ok();
                response
            }
            Err(LedgerError::AccountNotFound { account_number }) => TransferResponse::failure(
                from,
                to,
                TransactionStatus::AccountNotFound,
                format!("Account {account_number} not found.")
            )
        }
    }

    fn audit(&self, message: String) {
        self.audit.append(Utc::now(), &message);
    }
}
