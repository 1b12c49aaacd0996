//! Message component handling
//!
//! Decodes button clicks on reminder notifications into structured
//! actions and applies them. Custom ids are the only place action
//! strings appear; everything past this boundary works with
//! [`ReminderAction`] values.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use log::{debug, info, warn};
use serenity::builder::CreateComponents;
use serenity::model::application::component::ButtonStyle;
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::prelude::Context;

use crate::features::reminders::actions::{ActionEngine, ReminderAction};

const DONE_PREFIX: &str = "reminder_done:";
const SNOOZE_PREFIX: &str = "reminder_snooze:";

/// Decode a component custom id into a reminder action. Ids that don't
/// belong to this module return `None` and are ignored by the caller.
pub fn decode_action(custom_id: &str) -> Option<ReminderAction> {
    if let Some(id) = custom_id.strip_prefix(DONE_PREFIX) {
        return Some(ReminderAction::Done {
            reminder_id: id.to_string(),
        });
    }
    if let Some(id) = custom_id.strip_prefix(SNOOZE_PREFIX) {
        return Some(ReminderAction::Snooze {
            reminder_id: id.to_string(),
        });
    }
    None
}

/// Handler for all message component interactions
pub struct MessageComponentHandler {
    actions: ActionEngine,
}

impl MessageComponentHandler {
    pub fn new(actions: ActionEngine) -> Self {
        Self { actions }
    }

    /// Handle a component interaction end to end: decode, apply, and
    /// update the originating message.
    pub async fn handle_component_interaction(
        &self,
        ctx: &Context,
        interaction: &MessageComponentInteraction,
    ) -> Result<()> {
        let custom_id = &interaction.data.custom_id;
        let user_id = interaction.user.id.to_string();

        info!("Processing component interaction: {custom_id} from user: {user_id}");

        let Some(action) = decode_action(custom_id) else {
            debug!("Ignoring unknown component id: {custom_id}");
            interaction
                .create_interaction_response(&ctx.http, |response| {
                    response.kind(InteractionResponseType::DeferredUpdateMessage)
                })
                .await?;
            return Ok(());
        };

        match action {
            ReminderAction::Done { reminder_id } => {
                self.actions.mark_done(&reminder_id).await?;
                interaction
                    .create_interaction_response(&ctx.http, |response| {
                        response
                            .kind(InteractionResponseType::UpdateMessage)
                            .interaction_response_data(|message| {
                                message
                                    .content("✅ Done! Reminder marked as completed.")
                                    .set_components(CreateComponents::default())
                            })
                    })
                    .await?;
            }
            ReminderAction::Snooze { reminder_id } => {
                let content = match self.actions.snooze(&reminder_id).await? {
                    Some(successor) => {
                        info!(
                            "Snoozed reminder {reminder_id} into {} due at {}",
                            successor.id, successor.due_at
                        );
                        format!(
                            "⏰ Snoozed! I'll remind you again in {} minutes.",
                            self.actions.snooze_minutes()
                        )
                    }
                    None => {
                        warn!("Snooze requested for unknown reminder {reminder_id}");
                        "🤷 That reminder is gone; nothing to snooze.".to_string()
                    }
                };
                interaction
                    .create_interaction_response(&ctx.http, |response| {
                        response
                            .kind(InteractionResponseType::UpdateMessage)
                            .interaction_response_data(|message| {
                                message
                                    .content(content)
                                    .set_components(CreateComponents::default())
                            })
                    })
                    .await?;
            }
        }

        Ok(())
    }

    /// Create the done/snooze button row attached to every reminder
    /// notification.
    pub fn create_reminder_buttons(reminder_id: &str) -> CreateComponents {
        CreateComponents::default()
            .create_action_row(|row| {
                row.create_button(|button| {
                    button
                        .custom_id(format!("{DONE_PREFIX}{reminder_id}"))
                        .label("✅ Done")
                        .style(ButtonStyle::Success)
                })
                .create_button(|button| {
                    button
                        .custom_id(format!("{SNOOZE_PREFIX}{reminder_id}"))
                        .label("⏰ Snooze")
                        .style(ButtonStyle::Secondary)
                })
            })
            .to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_done_action() {
        let action = decode_action("reminder_done:abc-123").expect("decodes");
        assert_eq!(
            action,
            ReminderAction::Done {
                reminder_id: "abc-123".to_string()
            }
        );
    }

    #[test]
    fn test_decode_snooze_action() {
        let action = decode_action("reminder_snooze:abc-123").expect("decodes");
        assert_eq!(
            action,
            ReminderAction::Snooze {
                reminder_id: "abc-123".to_string()
            }
        );
    }

    #[test]
    fn test_decode_rejects_foreign_ids() {
        assert!(decode_action("persona_chef").is_none());
        assert!(decode_action("reminder_delete:abc").is_none());
        assert!(decode_action("").is_none());
    }

    #[test]
    fn test_decode_preserves_full_id() {
        let uuid = "550e8400-e29b-41d4-a716-446655440000";
        match decode_action(&format!("reminder_done:{uuid}")) {
            Some(ReminderAction::Done { reminder_id }) => assert_eq!(reminder_id, uuid),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_create_reminder_buttons() {
        let components = MessageComponentHandler::create_reminder_buttons("abc-123");
        assert!(!components.0.is_empty());
    }
}
