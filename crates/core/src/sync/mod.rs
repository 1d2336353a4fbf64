//! Local-first synchronization engine.

mod connectivity;
mod queue;
mod record;
mod runtime;
mod synchronizer;

pub use connectivity::*;
pub use queue::*;
pub use record::*;
pub use runtime::*;
pub use synchronizer::*;
