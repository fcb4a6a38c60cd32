//! Entity-level rules checked before every save.
//!
//! Field format rules live on [`UserRequest`](crate::models::UserRequest);
//! this only guards invariants of the stored record.

use crate::error::{UserError, UserResult};
use crate::models::User;

pub const USER_REQUIRED: &str = "User cannot be null";
pub const ROLES_REQUIRED: &str = "User must have at least one role";

/// Rejects a missing user or one without roles.
pub fn validate(user: Option<&User>) -> UserResult<()> {
    let user = user.ok_or(UserError::InvalidRoles(USER_REQUIRED))?;

    if user.roles.is_empty() {
        return Err(UserError::InvalidRoles(ROLES_REQUIRED));
    }

    Ok(())
}
