//! Command router
//!
//! Turns inbound user events (text, transcribed voice) into replies.
//! Text goes through the intent oracle; reminder intents are persisted
//! with a resolved due time, meeting and message intents are pure
//! formatting, chat replies pass through verbatim. Every collaborator
//! failure is converted into a short user-visible message here; nothing
//! in this path panics or crashes the process.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::response::truncate_for_message;
use crate::features::intent::{IntentOracle, StructuredIntent};
use crate::features::reminders::due_time::resolve_due_time;
use crate::features::reminders::store::{NewReminder, Reminder, ReminderStore};
use crate::features::audio::VoiceTranscriber;

/// Reply for oracle failures (transport or unparseable output).
const CLASSIFICATION_FAILED_REPLY: &str =
    "❌ Sorry, I couldn't make sense of that. Please try rephrasing.";

/// Reply for transcription failures; distinct from classification so the
/// user knows the audio failed, not the command.
const TRANSCRIPTION_FAILED_REPLY: &str =
    "🎙️ Sorry, I couldn't understand that audio. Try again or type the command.";

/// Reply when persisting a reminder fails.
const STORE_FAILED_REPLY: &str =
    "❌ Sorry, I couldn't save that reminder. Please try again in a moment.";

/// Text command that lists active reminders without involving the oracle.
const LIST_COMMAND: &str = "!reminders";

/// Text command for the onboarding/capabilities reply.
const HELP_COMMAND: &str = "!help";

pub struct CommandHandler {
    oracle: Arc<dyn IntentOracle>,
    store: Arc<dyn ReminderStore>,
    transcriber: Arc<dyn VoiceTranscriber>,
}

impl CommandHandler {
    pub fn new(
        oracle: Arc<dyn IntentOracle>,
        store: Arc<dyn ReminderStore>,
        transcriber: Arc<dyn VoiceTranscriber>,
    ) -> Self {
        CommandHandler {
            oracle,
            store,
            transcriber,
        }
    }

    /// Handle a text command and produce the reply to send back.
    pub async fn handle_text(&self, owner: &str, content: &str) -> String {
        let content = content.trim();
        if content.eq_ignore_ascii_case(LIST_COMMAND) {
            return self.list_reminders(owner).await;
        }
        if content.eq_ignore_ascii_case(HELP_COMMAND) {
            return help_reply(owner);
        }

        let request_id = Uuid::new_v4();
        debug!("[{request_id}] Classifying message from {owner}");

        let intent = match self.oracle.classify(content, Utc::now()).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!("[{request_id}] Classification failed: {e}");
                return CLASSIFICATION_FAILED_REPLY.to_string();
            }
        };

        match intent {
            StructuredIntent::Chat { reply } => reply,
            StructuredIntent::Reminder {
                text,
                person,
                datetime,
                delay_minutes,
            } => {
                self.create_reminder(owner, request_id, text, person, datetime, delay_minutes)
                    .await
            }
            StructuredIntent::Meeting {
                title,
                datetime,
                duration_minutes,
                participants,
            } => format_meeting(&title, datetime.as_deref(), duration_minutes, &participants),
            StructuredIntent::Message { to, text } => format_message_draft(&to, &text),
        }
    }

    /// Handle a voice message: transcribe, then run the text pipeline.
    pub async fn handle_voice(&self, owner: &str, url: &str, filename: &str) -> String {
        match self.transcriber.transcribe(url, filename).await {
            Ok(transcript) => {
                info!("Transcribed voice message from {owner}: {} chars", transcript.len());
                let reply = self.handle_text(owner, &transcript).await;
                // Long dictations are echoed in truncated form so the
                // quote stays within one message.
                let quoted = truncate_for_message(transcript.trim());
                format!("🎙️ *{quoted}*\n\n{reply}")
            }
            Err(e) => {
                warn!("Transcription failed for {owner}: {e}");
                TRANSCRIPTION_FAILED_REPLY.to_string()
            }
        }
    }

    async fn create_reminder(
        &self,
        owner: &str,
        request_id: Uuid,
        text: String,
        person: Option<String>,
        datetime: Option<String>,
        delay_minutes: Option<i64>,
    ) -> String {
        let now = Utc::now();
        let (due_at, when_label) = resolve_due_time(datetime.as_deref(), delay_minutes, now);

        let created = self
            .store
            .create(NewReminder {
                owner: owner.to_string(),
                text,
                person,
                due_at,
            })
            .await;

        match created {
            Ok(reminder) => {
                info!(
                    "[{request_id}] Created reminder {} due at {}",
                    reminder.id, reminder.due_at
                );
                let mut reply = format!("✅ **Reminder set!**\n\n📝 {}", reminder.text);
                if let Some(person) = &reminder.person {
                    reply.push_str(&format!("\n👤 For: {person}"));
                }
                reply.push_str(&format!("\n⏰ When: {when_label}"));
                reply
            }
            Err(e) => {
                warn!("[{request_id}] Failed to persist reminder: {e}");
                STORE_FAILED_REPLY.to_string()
            }
        }
    }

    /// Render the active-reminder listing for an owner. An empty list is
    /// a normal outcome, not an error.
    async fn list_reminders(&self, owner: &str) -> String {
        let now = Utc::now();
        let active = match self.store.query_active(owner, now).await {
            Ok(active) => active,
            Err(e) => {
                warn!("Failed to list reminders for {owner}: {e}");
                return "❌ Sorry, I couldn't fetch your reminders right now.".to_string();
            }
        };

        if active.is_empty() {
            return "📭 No active reminders.".to_string();
        }

        let mut reply = String::from("📋 **Active reminders:**\n\n");
        for (i, reminder) in active.iter().enumerate() {
            reply.push_str(&format_listing_line(i + 1, reminder, now));
        }
        reply
    }
}

fn format_listing_line(index: usize, reminder: &Reminder, now: chrono::DateTime<Utc>) -> String {
    let seconds_left = (reminder.due_at - now).num_seconds().max(0);
    let mut line = format!(
        "{index}. ⏰ {} (in {}): {}",
        reminder.due_at.format("%Y-%m-%d %H:%M"),
        format_duration(seconds_left),
        reminder.text
    );
    if let Some(person) = &reminder.person {
        line.push_str(&format!(" 👤 {person}"));
    }
    line.push('\n');
    line
}

/// Onboarding reply describing what the bot understands.
fn help_reply(owner: &str) -> String {
    format!(
        "👋 Hi! I'm Jarvis, your personal assistant.\n\n\
         Your channel ID: `{owner}`\n\n\
         What I can do:\n\
         • Reminders: *\"remind me to call Alex tomorrow at 10\"*\n\
         • Meetings: *\"set up a meeting with the team on Friday at 15:00\"*\n\
         • Messages: *\"write a message to Kate that I'm running late\"*\n\
         • Voice notes: send an audio message and I'll transcribe it\n\
         • `!reminders`: list your active reminders\n\n\
         Just talk to me! 🎯"
    )
}

fn format_meeting(
    title: &str,
    datetime: Option<&str>,
    duration_minutes: i64,
    participants: &[String],
) -> String {
    let when = datetime.unwrap_or("time not specified");
    let mut reply = format!(
        "📅 **Meeting noted!**\n\n📌 {title}\n⏰ {when}\n⌛ {duration_minutes} minutes\n"
    );
    if !participants.is_empty() {
        reply.push_str(&format!("👥 Participants: {}\n", participants.join(", ")));
    }
    reply.push_str("\n_Calendar integration is on the roadmap._");
    reply
}

fn format_message_draft(to: &str, text: &str) -> String {
    format!(
        "✉️ **Draft for {to}:**\n\n_{text}_\n\n_(Copy and send it yourself; auto-sending is not wired up.)_"
    )
}

/// Format a duration in seconds into a human-readable string.
fn format_duration(seconds: i64) -> String {
    if seconds < 60 {
        format!("{} second{}", seconds, if seconds == 1 { "" } else { "s" })
    } else if seconds < 3600 {
        let mins = seconds / 60;
        format!("{} minute{}", mins, if mins == 1 { "" } else { "s" })
    } else if seconds < 86400 {
        let hours = seconds / 3600;
        let mins = (seconds % 3600) / 60;
        if mins > 0 {
            format!(
                "{} hour{} {} minute{}",
                hours,
                if hours == 1 { "" } else { "s" },
                mins,
                if mins == 1 { "" } else { "s" }
            )
        } else {
            format!("{} hour{}", hours, if hours == 1 { "" } else { "s" })
        }
    } else {
        let days = seconds / 86400;
        let hours = (seconds % 86400) / 3600;
        if hours > 0 {
            format!(
                "{} day{} {} hour{}",
                days,
                if days == 1 { "" } else { "s" },
                hours,
                if hours == 1 { "" } else { "s" }
            )
        } else {
            format!("{} day{}", days, if days == 1 { "" } else { "s" })
        }
    }
}
