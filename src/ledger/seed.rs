use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use csv::{ReaderBuilder, Trim};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::error;

/// One row of the account seed source consumed at server start.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedAccount {
    pub account: String,
    #[serde(default)]
    pub owner: String,
    pub balance: Decimal
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Seed error: could not open [{path}]: {source}")]
    Open {
        path: String,
        source: std::io::Error
    }
}

/// Built-in demo account set, used when no seed file is given.
pub fn default_seed() -> Vec<SeedAccount> {
    [
        ("1111", "Alice", "1000.00"),
        ("2222", "Bob", "500.50"),
        ("3333", "Bank Reserve", "999999.00")
    ]
    .into_iter()
    .map(|(account, owner, balance)| SeedAccount {
        account: account.to_string(),
        owner: owner.to_string(),
        balance: Decimal::from_str(balance).unwrap_or_default()
    })
    .collect()
}

/// Reads seed accounts from a `account,owner,balance` CSV file.
///
/// Malformed rows are logged and skipped rather than aborting startup, the
/// same policy the engine applies to malformed requests.
pub fn load_seed_csv(path: impl AsRef<Path>) -> Result<Vec<SeedAccount>, SeedError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| SeedError::Open {
        path: path.display().to_string(),
        source
    })?;

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let mut accounts = Vec::new();
    for result in reader.deserialize::<SeedAccount>() {
        match result {
            Ok(seed) => accounts.push(seed),
            Err(err) => error!("Seed CSV deserialization error: {err}")
        }
    }

    Ok(accounts)
}
