//! Guest cookie codec
//!
//! Brand text travels base64 (URL-safe, unpadded) so that separators in the
//! text never break the cookie header. The usage counter is a plain integer
//! string and is passed through undecoded; the quota gate owns its parsing.
//! Reading the `Cookie` request header is left to warp's cookie filters.

use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64;
use base64::Engine;
use scribe_core::{ClientCookie, GuestState, GUEST_BRAND_COOKIE};

/// Attributes shared by every cookie the service sets
const COOKIE_ATTRIBUTES: &str = "Path=/; HttpOnly; SameSite=Lax";

/// Build guest state from the raw cookie values
///
/// A brand cookie that does not decode to UTF-8 text is treated as absent.
#[must_use]
pub fn guest_state(usage_counter: Option<String>, brand: Option<&str>) -> GuestState {
    GuestState {
        usage_counter: usage_counter.map(|value| value.trim().to_string()),
        brand: brand.and_then(|value| decode_text(value.trim())),
    }
}

/// Render a `Set-Cookie` header value
#[must_use]
pub fn set_cookie_header(cookie: &ClientCookie) -> String {
    let value = if cookie.is_removal() {
        String::new()
    } else if cookie.name == GUEST_BRAND_COOKIE {
        encode_text(&cookie.value)
    } else {
        cookie.value.clone()
    };
    format!(
        "{}={}; Max-Age={}; {}",
        cookie.name, value, cookie.max_age_secs, COOKIE_ATTRIBUTES
    )
}

fn encode_text(text: &str) -> String {
    BASE64.encode(text.as_bytes())
}

fn decode_text(value: &str) -> Option<String> {
    let bytes = BASE64.decode(value).ok()?;
    String::from_utf8(bytes).ok().filter(|text| !text.trim().is_empty())
}
