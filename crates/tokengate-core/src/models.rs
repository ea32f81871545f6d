//! Domain models for tokengate.

pub mod exter;
pub mod session;
pub mod user;
