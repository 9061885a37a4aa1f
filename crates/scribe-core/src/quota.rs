//! Guest quota gate
//!
//! Anonymous callers get a fixed number of generations before they must
//! sign in. The counter lives with the client; [`QuotaStore`] abstracts
//! where it is read from and written to so the policy in [`QuotaGate`]
//! does not care.

use crate::types::{ClientCookie, GuestState};
use async_trait::async_trait;

/// Generations allowed before an anonymous caller must authenticate
pub const GUEST_GENERATION_LIMIT: u32 = 5;

/// Cookie carrying the guest usage counter
pub const GUEST_USAGE_COOKIE: &str = "scribe_guest_usage";

/// Outcome of a quota check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    /// Caller may proceed
    Allow,
    /// Caller is over the limit
    Deny {
        /// Generations already used
        used: u32,
        /// Caller must authenticate to continue
        require_auth: bool,
    },
}

impl QuotaDecision {
    /// Check if the caller may proceed
    #[inline]
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Quota policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaGate {
    limit: u32,
}

impl QuotaGate {
    /// Gate with the standard guest limit
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            limit: GUEST_GENERATION_LIMIT,
        }
    }

    /// Threshold in force
    #[inline]
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Decide whether the caller may generate
    ///
    /// Authenticated callers and disabled enforcement always pass. For
    /// everyone else the raw counter is parsed leniently and compared
    /// against the limit.
    #[must_use]
    pub fn check(
        &self,
        is_authenticated: bool,
        raw_counter: Option<&str>,
        enforcement_enabled: bool,
    ) -> QuotaDecision {
        if !enforcement_enabled || is_authenticated {
            return QuotaDecision::Allow;
        }

        let used = parse_counter(raw_counter);
        if used >= self.limit {
            QuotaDecision::Deny {
                used,
                require_auth: true,
            }
        } else {
            QuotaDecision::Allow
        }
    }
}

impl Default for QuotaGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a client counter token
///
/// Missing or malformed values count as zero. Digit strings too large for
/// `u32` saturate so an oversized value cannot wrap back under the limit.
#[must_use]
pub fn parse_counter(raw: Option<&str>) -> u32 {
    let Some(raw) = raw.map(str::trim) else {
        return 0;
    };
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    raw.parse::<u32>().unwrap_or(u32::MAX)
}

/// Counter value after one more successful generation
#[inline]
#[must_use]
pub fn next_counter(current: u32) -> u32 {
    current.saturating_add(1)
}

/// Where the guest counter is kept
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Raw counter for this client
    async fn read_counter(&self, guest: &GuestState) -> Option<String>;

    /// Persist a new counter value
    ///
    /// Returns the client-side write to attach to the response, if the
    /// store keeps its state with the client.
    async fn write_counter(&self, guest: &GuestState, value: u32) -> Option<ClientCookie>;
}

/// Counter held in a client cookie with a bounded lifetime
///
/// The counter resets only when the cookie expires.
#[derive(Debug, Clone, Copy)]
pub struct CookieQuotaStore {
    window_secs: u64,
}

impl CookieQuotaStore {
    /// Create store with cookie lifetime
    #[inline]
    #[must_use]
    pub fn new(window_secs: u64) -> Self {
        Self { window_secs }
    }
}

impl Default for CookieQuotaStore {
    fn default() -> Self {
        Self::new(24 * 60 * 60)
    }
}

#[async_trait]
impl QuotaStore for CookieQuotaStore {
    async fn read_counter(&self, guest: &GuestState) -> Option<String> {
        guest.usage_counter.clone()
    }

    async fn write_counter(&self, _guest: &GuestState, value: u32) -> Option<ClientCookie> {
        Some(ClientCookie::set(
            GUEST_USAGE_COOKIE,
            value.to_string(),
            self.window_secs,
        ))
    }
}
