// Core layer - shared configuration and response utilities
pub mod core;

// Features layer - all feature modules
pub mod features;

// Infrastructure - SQLite-backed reminder store
pub mod database;

// Application layer
pub mod command_handler;

// UI components - button decoding and reminder notification markup
pub mod message_components;

// Re-export core config for convenience
pub use core::Config;

// Re-export feature items
pub use features::{
    // Audio
    AudioTranscriber, VoiceTranscriber,
    // Intent
    ClassificationError, IntentOracle, OpenAiOracle, StructuredIntent,
    // Reminders
    ActionEngine, NewReminder, Reminder, ReminderAction, ReminderNotifier, ReminderScheduler,
    ReminderStatus, ReminderStore,
};

pub use command_handler::CommandHandler;
pub use database::Database;
pub use message_components::MessageComponentHandler;
