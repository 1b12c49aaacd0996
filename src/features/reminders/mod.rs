//! # Reminders Feature
//!
//! Reminder lifecycle: creation with due-time resolution, a polling
//! scheduler that delivers due reminders exactly once on the success
//! path, and done/snooze follow-up actions.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod actions;
pub mod due_time;
pub mod notifier;
pub mod scheduler;
pub mod store;

pub use actions::{ActionEngine, ReminderAction};
pub use notifier::DiscordNotifier;
pub use scheduler::{ReminderNotifier, ReminderScheduler};
pub use store::{NewReminder, Reminder, ReminderStatus, ReminderStore};
