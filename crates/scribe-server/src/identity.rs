//! Caller identity
//!
//! Sessions are handled upstream. The session layer forwards the account id
//! in [`USER_HEADER`]; a missing or blank header means an anonymous caller.

use crate::cookies;
use scribe_core::{CallerContext, UserId};

/// Header carrying the authenticated account id
pub const USER_HEADER: &str = "x-scribe-user";

/// Build the caller context from the identity header and guest cookies
#[must_use]
pub fn caller_context(
    user_header: Option<&str>,
    usage_cookie: Option<String>,
    brand_cookie: Option<&str>,
) -> CallerContext {
    CallerContext {
        user: user_header.and_then(UserId::parse),
        guest: cookies::guest_state(usage_cookie, brand_cookie),
    }
}
