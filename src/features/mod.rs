//! # Features Layer
//!
//! Feature modules for the jarvis assistant bot.

pub mod audio;
pub mod intent;
pub mod reminders;

// Re-export key feature items
pub use audio::{AudioTranscriber, VoiceTranscriber};
pub use intent::{ClassificationError, IntentOracle, OpenAiOracle, StructuredIntent};
pub use reminders::{
    ActionEngine, DiscordNotifier, NewReminder, Reminder, ReminderAction, ReminderNotifier,
    ReminderScheduler, ReminderStatus, ReminderStore,
};
