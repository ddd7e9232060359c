mod errors;
mod seed;
mod store;

pub use errors::LedgerError;
pub use seed::{SeedAccount, SeedError, default_seed, load_seed_csv};
pub use store::Ledger;
