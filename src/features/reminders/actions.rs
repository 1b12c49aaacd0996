//! Done/snooze state transitions
//!
//! Action events arrive asynchronously from the delivery channel after a
//! notification goes out. They are decoded into [`ReminderAction`] at
//! the transport boundary (see `message_components`) and applied here.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use chrono::Utc;
use log::{debug, info};
use std::sync::Arc;

use super::store::{NewReminder, Reminder, ReminderStore};

/// A decoded user action on a delivered reminder.
///
/// Unknown action identifiers never reach this type; the transport
/// decoder drops them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderAction {
    Done { reminder_id: String },
    Snooze { reminder_id: String },
}

/// Applies done/snooze transitions against the store.
pub struct ActionEngine {
    store: Arc<dyn ReminderStore>,
    snooze_minutes: i64,
}

impl ActionEngine {
    pub fn new(store: Arc<dyn ReminderStore>, snooze_minutes: i64) -> Self {
        ActionEngine {
            store,
            snooze_minutes,
        }
    }

    pub fn snooze_minutes(&self) -> i64 {
        self.snooze_minutes
    }

    /// Resolve a reminder. Idempotent: the action event may be delivered
    /// more than once, and a second invocation is a no-op.
    pub async fn mark_done(&self, reminder_id: &str) -> Result<()> {
        info!("Marking reminder {reminder_id} done");
        self.store.resolve(reminder_id).await
    }

    /// Push a reminder out by the configured snooze interval.
    ///
    /// Creates the successor (same text and person, due `now + snooze`)
    /// before resolving the original, so an interruption between the two
    /// writes leaves a duplicate pending reminder rather than a lost one.
    /// Returns the successor, or `None` when the original no longer
    /// exists.
    pub async fn snooze(&self, reminder_id: &str) -> Result<Option<Reminder>> {
        let Some(original) = self.store.get(reminder_id).await? else {
            debug!("Snooze for unknown reminder {reminder_id}, ignoring");
            return Ok(None);
        };

        let due_at = Utc::now() + chrono::Duration::minutes(self.snooze_minutes);
        let successor = self
            .store
            .create(NewReminder {
                owner: original.owner.clone(),
                text: original.text.clone(),
                person: original.person.clone(),
                due_at,
            })
            .await?;
        self.store.resolve(reminder_id).await?;

        info!(
            "Snoozed reminder {reminder_id} for {} min, successor {}",
            self.snooze_minutes, successor.id
        );
        Ok(Some(successor))
    }
}
