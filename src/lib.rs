//! Shared-memory banking engine: a single-slot mailbox transport between a
//! front-end and a back-end process, plus the ledger logic the back end runs
//! behind it.

pub mod client;
pub mod ledger;
pub mod models;
pub mod server;
pub mod transport;
pub mod wire;
