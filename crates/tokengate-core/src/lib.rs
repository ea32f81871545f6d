//! tokengate core: domain models, repository traits and the
//! boundary error type shared by every tokengate crate.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{ErrorCategory, GateError, GateResult};
