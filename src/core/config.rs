//! Environment-driven bot configuration
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::{Context, Result};

/// Default chat model used for intent classification and free chat.
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Default SQLite database path.
const DEFAULT_DATABASE_PATH: &str = "jarvis.db";

/// Default scheduler poll interval in seconds.
const DEFAULT_POLL_SECONDS: u64 = 30;

/// Default snooze interval in minutes.
const DEFAULT_SNOOZE_MINUTES: i64 = 30;

/// Runtime configuration, loaded once at startup from environment variables
/// (a `.env` file is honored via dotenvy before this is read).
#[derive(Clone, Debug)]
pub struct Config {
    pub discord_token: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub database_path: String,
    /// Seconds between scheduler ticks.
    pub poll_interval_seconds: u64,
    /// Minutes a snoozed reminder is pushed out.
    pub snooze_minutes: i64,
    pub log_level: String,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// `DISCORD_TOKEN` and `OPENAI_API_KEY` are required; everything else
    /// falls back to a sensible default.
    pub fn from_env() -> Result<Self> {
        let discord_token =
            std::env::var("DISCORD_TOKEN").context("DISCORD_TOKEN must be set")?;
        let openai_api_key =
            std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?;

        let openai_model = std::env::var("OPENAI_MODEL")
            .unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string());
        let database_path = std::env::var("DATABASE_PATH")
            .unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string());
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let poll_interval_seconds = parse_or_default(
            std::env::var("REMINDER_POLL_SECONDS").ok().as_deref(),
            DEFAULT_POLL_SECONDS,
        );
        let snooze_minutes = parse_or_default(
            std::env::var("SNOOZE_MINUTES").ok().as_deref(),
            DEFAULT_SNOOZE_MINUTES,
        );

        Ok(Config {
            discord_token,
            openai_api_key,
            openai_model,
            database_path,
            poll_interval_seconds,
            snooze_minutes,
            log_level,
        })
    }
}

/// Parse an optional env value, falling back on missing or malformed input.
fn parse_or_default<T: std::str::FromStr + Copy>(value: Option<&str>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
