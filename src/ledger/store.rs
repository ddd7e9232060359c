use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::{error, warn};

use crate::ledger::errors::LedgerError;
use crate::ledger::seed::SeedAccount;
use crate::models::{Account, AccountError, HistoryEntry};

/// In-memory account store enforcing the balance invariants.
///
/// Accounts are seeded once at server start and live for the process
/// lifetime; there is no runtime creation or deletion. The dispatcher
/// serializes all mutations, so the concurrent map is uncontended in normal
/// operation; it keeps single-account mutations safe should embedding code
/// ever drive the ledger from more than one thread.
pub struct Ledger {
    accounts: DashMap<String, Account>
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new()
        }
    }

    pub fn seed(&self, accounts: impl IntoIterator<Item = SeedAccount>) {
        for seed in accounts {
            if seed.balance.is_sign_negative() {
                warn!("Skipping seed account [{}] with negative balance {}", seed.account, seed.balance);
                continue;
            }
            self.accounts.insert(
                seed.account.clone(),
                Account::new(seed.account, seed.owner, seed.balance)
            );
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn exists(&self, account_number: &str) -> bool {
        self.accounts.contains_key(account_number)
    }

    pub fn balance(&self, account_number: &str) -> Result<Decimal, LedgerError> {
        self.accounts
            .get(account_number)
            .map(|account| account.balance())
            .ok_or_else(|| LedgerError::account_not_found(account_number))
    }

    pub fn history(&self, account_number: &str, max: usize) -> Result<Vec<HistoryEntry>, LedgerError> {
        self.accounts
            .get(account_number)
            .map(|account| account.history(max))
            .ok_or_else(|| LedgerError::account_not_found(account_number))
    }

    /// Deposits into an account; returns the new balance. A deposit that
    /// would overflow the balance leaves the account untouched.
    pub fn credit(&self, account_number: &str, amount: Decimal) -> Result<Decimal, LedgerError> {
        let mut account = self
            .accounts
            .get_mut(account_number)
            .ok_or_else(|| LedgerError::account_not_found(account_number))?;

        account
            .credit(amount)
            .map_err(|_| LedgerError::balance_overflow(account_number))
    }

    /// Withdraws from an account; on insufficient funds the balance is left
    /// untouched and the failure is reported with it.
    pub fn debit(&self, account_number: &str, amount: Decimal) -> Result<Decimal, LedgerError> {
        let mut account = self
            .accounts
            .get_mut(account_number)
            .ok_or_else(|| LedgerError::account_not_found(account_number))?;

        account.debit(amount).map_err(|err| match err {
            AccountError::InsufficientFunds { .. } => {
                LedgerError::insufficient_funds(account_number, account.balance())
            }
            AccountError::Overflow { .. } => LedgerError::balance_overflow(account_number)
        })
    }

    /// Moves `amount` between two accounts, preserving the sum of the two
    /// balances. Returns `(from_balance, to_balance)` after the move.
    ///
    /// Debit and credit are two separate map operations; if the credit side
    /// fails the debit is rolled back, so a failed transfer never leaves
    /// money missing. The two guards are never held at once, which also
    /// keeps same-shard lookups deadlock free.
    pub fn transfer(&self, from: &str, to: &str, amount: Decimal) -> Result<(Decimal, Decimal), LedgerError> {
        if !self.exists(to) {
            return Err(LedgerError::account_not_found(to));
        }

        let from_balance = self.debit(from, amount)?;

        match self.credit(to, amount) {
            Ok(to_balance) => Ok((from_balance, to_balance)),
            Err(err) => {
                // The credit side can still fail if the destination balance
                // would overflow; refund the debit rather than lose the
                // money. The refund restores a balance the account just
                // held, so it cannot overflow itself.
                error!("Transfer credit to [{to}] failed after debiting [{from}], rolling back: {err}");
                if self.credit(from, amount).is_err() {
                    error!("Rollback credit to [{from}] failed; ledger no longer balances");
                }
                Err(err)
            }
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
