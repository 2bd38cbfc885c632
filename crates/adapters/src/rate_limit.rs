// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rate-limit message detection for assistant/text events (§4.4.4).

use chrono::{DateTime, Utc};

/// A detected rate-limit notice, carrying the executable path the dispatcher
/// and steward scheduler use as the sole back-off coordination key.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitSignal {
    pub executable_path: String,
    pub resets_at: DateTime<Utc>,
    pub message: String,
}

/// Scans assistant text for the rate-limit message pattern. Recognizes a
/// `resets at <ISO-8601>` hint; falls back to `now + 1 hour` when no
/// timestamp is present but the message still clearly indicates a rate
/// limit.
pub fn detect(executable_path: &str, text: &str, now: DateTime<Utc>) -> Option<RateLimitSignal> {
    let lowered = text.to_ascii_lowercase();
    if !(lowered.contains("rate limit") || lowered.contains("rate-limited") || lowered.contains("usage limit")) {
        return None;
    }

    let resets_at = extract_reset_timestamp(text).unwrap_or(now + chrono::Duration::hours(1));

    Some(RateLimitSignal { executable_path: executable_path.to_string(), resets_at, message: text.to_string() })
}

fn extract_reset_timestamp(text: &str) -> Option<DateTime<Utc>> {
    for token in text.split_whitespace() {
        let trimmed = token.trim_matches(|c: char| !(c.is_ascii_alphanumeric() || c == ':' || c == '-' || c == '+' || c == '.'));
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    None
}
