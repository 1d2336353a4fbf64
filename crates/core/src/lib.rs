//! PocketLedger core: local-first domain services for personal finance.
//!
//! Every mutation lands in the local store first and is pushed to the remote
//! when connectivity allows; reads prefer the remote and fall back to the
//! local snapshot. The id namespace tells confirmation state apart: ids
//! starting with `local:` have not been acknowledged by the remote yet.

pub mod accounts;
pub mod budgets;
pub mod context;
pub mod errors;
pub mod events;
pub mod goals;
pub mod remote;
pub mod store;
pub mod sync;
pub mod transactions;

pub use context::ServiceContext;
pub use errors::{Error, Result};
