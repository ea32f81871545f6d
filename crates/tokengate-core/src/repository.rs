//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. A missing record is reported
//! as `Ok(None)` so that callers can treat "not found" as an ordinary
//! outcome rather than an error.

use crate::error::GateResult;
use crate::models::exter::ExterToken;
use crate::models::user::User;

pub trait UserRepository: Send + Sync {
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = GateResult<Option<User>>> + Send;

    /// Resolve the local account bound to an external identity, creating
    /// it on first login.
    fn create_from_exter_token(
        &self,
        token: &ExterToken,
    ) -> impl Future<Output = GateResult<Option<User>>> + Send;
}
