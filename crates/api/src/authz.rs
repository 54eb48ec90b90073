//! Ownership checks used inside handlers, after the role guard has run.

use workify_auth::PolicyEngine;

use crate::app::errors::ApiError;
use crate::context::CallerContext;

/// The caller must be the owner named by `owner_email`.
///
/// `None` (missing query parameter or missing resource) is always forbidden.
pub fn require_owner(
    engine: &PolicyEngine,
    ctx: &CallerContext,
    owner_email: Option<&str>,
) -> Result<(), ApiError> {
    engine.require_owner(ctx.caller(), owner_email)?;
    Ok(())
}
