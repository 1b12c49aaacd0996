//! Due-time resolution policy
//!
//! Turns the classifier's reminder fields into a single absolute due
//! timestamp at creation time. Priority order, first match wins:
//! explicit absolute date-time, then relative delay, then a one-hour
//! default. A malformed date-time string is treated as absent rather
//! than rejected; the policy always produces a reminder.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use chrono::{DateTime, NaiveDateTime, Utc};

/// Format the classifier is instructed to emit for absolute times (UTC).
pub const ABSOLUTE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Fallback delay when neither an absolute time nor a relative delay is
/// given.
const DEFAULT_DUE_MINUTES: i64 = 60;

/// Resolve the due timestamp for a new reminder.
///
/// Returns the timestamp together with a human-readable label for the
/// confirmation message ("on 2026-09-01 at 10:00 UTC", "in 15 minutes",
/// "in 1 hour").
pub fn resolve_due_time(
    datetime: Option<&str>,
    delay_minutes: Option<i64>,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, String) {
    if let Some(raw) = datetime {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw.trim(), ABSOLUTE_FORMAT) {
            let due = DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc);
            let label = format!("on {} UTC", due.format("%Y-%m-%d at %H:%M"));
            return (due, label);
        }
        // Unparseable date-times fall through to the delay rule.
    }

    if let Some(delay) = delay_minutes {
        let due = now + chrono::Duration::minutes(delay);
        let label = format!(
            "in {} minute{}",
            delay,
            if delay == 1 { "" } else { "s" }
        );
        return (due, label);
    }

    (
        now + chrono::Duration::minutes(DEFAULT_DUE_MINUTES),
        "in 1 hour".to_string(),
    )
}
