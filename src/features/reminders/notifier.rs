//! Discord delivery channel for due reminders
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::{Context as AnyhowContext, Result};
use async_trait::async_trait;
use log::info;
use serenity::http::Http;
use serenity::model::id::ChannelId;
use std::sync::Arc;

use crate::message_components::MessageComponentHandler;

use super::scheduler::ReminderNotifier;
use super::store::Reminder;

/// Sends reminder notifications as Discord messages with done/snooze
/// buttons attached.
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        DiscordNotifier { http }
    }
}

/// Message body for a due reminder.
pub(crate) fn notification_body(reminder: &Reminder) -> String {
    let mut body = format!("🔔 **Reminder**\n\n{}", reminder.text);
    if let Some(person) = &reminder.person {
        body.push_str(&format!("\n👤 For: {person}"));
    }
    body
}

#[async_trait]
impl ReminderNotifier for DiscordNotifier {
    async fn notify(&self, reminder: &Reminder) -> Result<()> {
        let channel_id: u64 = reminder
            .owner
            .parse()
            .with_context(|| format!("invalid owner channel id: {}", reminder.owner))?;

        ChannelId(channel_id)
            .send_message(&self.http, |message| {
                message
                    .content(notification_body(reminder))
                    .set_components(MessageComponentHandler::create_reminder_buttons(
                        &reminder.id,
                    ))
            })
            .await
            .with_context(|| format!("failed to deliver reminder {}", reminder.id))?;

        info!("Delivered reminder {} to channel {channel_id}", reminder.id);
        Ok(())
    }
}
