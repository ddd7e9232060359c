use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Insufficient funds on account [{account_number}]: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account_number: String,
        balance: Decimal,
        requested: Decimal
    },
    #[error("Balance overflow on account [{account_number}]")]
    Overflow {
        account_number: String
    }
}

impl AccountError {
    pub fn insufficient_funds(account_number: &str, balance: Decimal, requested: Decimal) -> Self {
        Self::InsufficientFunds {
            account_number: account_number.to_string(),
            balance,
            requested
        }
    }

    pub fn overflow(account_number: &str) -> Self {
        Self::Overflow {
            account_number: account_number.to_string()
        }
    }
}
