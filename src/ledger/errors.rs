use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Account [{account_number}] not found")]
    AccountNotFound {
        account_number: String
    },
    #[error("Insufficient funds on account [{account_number}]: balance {balance}")]
    InsufficientFunds {
        account_number: String,
        balance: Decimal
    },
    #[error("Balance overflow on account [{account_number}]")]
    BalanceOverflow {
        account_number: String
    }
}

impl LedgerError {
    pub fn account_not_found(account_number: &str) -> Self {
        Self::AccountNotFound {
            account_number: account_number.to_string()
        }
    }

    pub fn insufficient_funds(account_number: &str, balance: Decimal) -> Self {
        Self::InsufficientFunds {
            account_number: account_number.to_string(),
            balance
        }
    }

    pub fn balance_overflow(account_number: &str) -> Self {
        Self::BalanceOverflow {
            account_number: account_number.to_string()
        }
    }
}
