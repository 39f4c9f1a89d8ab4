// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Format a Unix timestamp in milliseconds (the auth provider's encoding).
///
/// Out-of-range values fall back to the epoch.
pub fn format_millis_rfc3339(millis: i64) -> String {
    format_utc_rfc3339(DateTime::from_timestamp_millis(millis).unwrap_or_default())
}
