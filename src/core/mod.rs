//! # Core Module
//!
//! Configuration and shared response utilities for the jarvis bot.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod config;
pub mod response;

// Re-export commonly used items
pub use config::Config;
pub use response::{chunk_for_message, chunk_text, truncate_for_message, MESSAGE_LIMIT};
