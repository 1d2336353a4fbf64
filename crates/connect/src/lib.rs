//! Remote store client for the hosted PocketLedger collections API.
//!
//! Wraps the REST endpoints behind the core crate's [`RemoteStore`] seam so
//! the sync engine stays oblivious to transport details. Requests carry a
//! bearer token identifying the ledger owner; the backend scopes every
//! collection to that identity.
//!
//! [`RemoteStore`]: pocketledger_core::remote::RemoteStore

mod client;

pub use client::ConnectClient;
