//! Wall clock helpers for record timestamps and cache lifetimes.

use chrono::Utc;

/// Current time as seconds since the Unix epoch.
#[must_use]
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// An entry stored at `stored_at` is fresh iff `stored_at + lifetime > now`.
/// No lifetime means the entry never expires.
#[must_use]
pub fn is_fresh(stored_at: i64, lifetime_secs: Option<u64>, now: i64) -> bool {
    match lifetime_secs {
        None => true,
        Some(lifetime) => {
            let lifetime = i64::try_from(lifetime).unwrap_or(i64::MAX);
            stored_at.saturating_add(lifetime) > now
        }
    }
}
