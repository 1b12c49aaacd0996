//! Reminder entity and store abstraction
//!
//! The store is the single source of truth for reminder state. The
//! scheduler and the command router never cache rows across calls, so
//! restarts cannot lose pending reminders.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Storage format for timestamps (UTC). Lexicographic order matches
/// chronological order, so string comparison in SQL is safe.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Resolution state of a reminder. Pending is the initial state;
/// Resolved is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderStatus {
    Pending,
    Resolved,
}

/// A scheduled one-time notification.
///
/// `due_at` is set exactly once at creation; a snooze creates a new row
/// instead of rewriting it, which keeps an auditable history.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub id: String,
    /// Opaque chat identity the notification is delivered to.
    pub owner: String,
    pub text: String,
    pub person: Option<String>,
    pub due_at: DateTime<Utc>,
    pub status: ReminderStatus,
}

impl Reminder {
    /// Due predicate: still pending and the due time has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == ReminderStatus::Pending && self.due_at <= now
    }
}

/// Fields for a reminder about to be persisted.
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub owner: String,
    pub text: String,
    pub person: Option<String>,
    pub due_at: DateTime<Utc>,
}

/// Durable reminder storage.
///
/// All mutations are single-row writes. `resolve` must be idempotent:
/// resolving an already-resolved or unknown id is a no-op because the
/// delivery channel may replay action events.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Persist a new pending reminder and return it with its assigned id.
    async fn create(&self, reminder: NewReminder) -> Result<Reminder>;

    /// Fetch a reminder by id.
    async fn get(&self, id: &str) -> Result<Option<Reminder>>;

    /// Flip a pending reminder to resolved. No-op for resolved or
    /// unknown ids.
    async fn resolve(&self, id: &str) -> Result<()>;

    /// All pending reminders with `due_at <= now`.
    async fn query_due(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>>;

    /// All pending reminders for `owner` with `due_at > now`, ordered
    /// ascending by due time.
    async fn query_active(&self, owner: &str, now: DateTime<Utc>) -> Result<Vec<Reminder>>;
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn reminder(status: ReminderStatus, due_offset_minutes: i64) -> Reminder {
        Reminder {
            id: "r-1".to_string(),
            owner: "42".to_string(),
            text: "call Alex".to_string(),
            person: None,
            due_at: Utc::now() + Duration::minutes(due_offset_minutes),
            status,
        }
    }

    #[test]
    fn test_due_predicate() {
        let now = Utc::now();
        assert!(reminder(ReminderStatus::Pending, -5).is_due(now));
        assert!(!reminder(ReminderStatus::Pending, 5).is_due(now));
        assert!(!reminder(ReminderStatus::Resolved, -5).is_due(now));
    }
}
