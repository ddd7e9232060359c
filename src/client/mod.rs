mod bank_client;

pub use bank_client::{BankClient, ClientError};
