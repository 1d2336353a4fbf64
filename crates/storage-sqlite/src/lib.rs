//! SQLite persistence for the PocketLedger sync engine.
//!
//! Implements the core crate's [`LocalStore`](pocketledger_core::store::LocalStore)
//! seam over a single document table, so cache snapshots and sync queues
//! survive process restarts.

pub mod db;
pub mod errors;
pub mod schema;

mod model;
mod store;

pub use store::SqliteStore;
