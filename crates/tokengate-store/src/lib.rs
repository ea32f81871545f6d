//! tokengate store: an in-memory implementation of the
//! [`UserRepository`](tokengate_core::repository::UserRepository) trait.
//!
//! This crate provides:
//! - [`MemoryUserRepository`], safe to share between concurrent requests
//! - JSON seed loading ([`load_seed_file`])
//! - Error types ([`StoreError`])

mod error;
mod memory;
mod seed;

pub use error::StoreError;
pub use memory::MemoryUserRepository;
pub use seed::{load_seed_file, parse_seed};
