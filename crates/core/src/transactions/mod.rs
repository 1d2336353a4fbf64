//! Transaction domain: models and service.

mod model;
mod service;

pub use model::*;
pub use service::*;
