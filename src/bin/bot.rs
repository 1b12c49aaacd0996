use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info};
use serenity::async_trait;
use serenity::model::application::interaction::Interaction;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use jarvis::core::response::chunk_for_message;
use jarvis::core::Config;
use jarvis::database::Database;
use jarvis::features::audio::AudioTranscriber;
use jarvis::features::intent::OpenAiOracle;
use jarvis::features::reminders::{ActionEngine, DiscordNotifier, ReminderScheduler, ReminderStore};
use jarvis::message_components::MessageComponentHandler;
use jarvis::CommandHandler;

struct Handler {
    command_handler: Arc<CommandHandler>,
    component_handler: Arc<MessageComponentHandler>,
}

impl Handler {
    fn new(command_handler: CommandHandler, component_handler: MessageComponentHandler) -> Self {
        Handler {
            command_handler: Arc::new(command_handler),
            component_handler: Arc::new(component_handler),
        }
    }

    /// First attachment that looks like audio we can transcribe, if any.
    fn audio_attachment(msg: &Message) -> Option<(&str, &str)> {
        msg.attachments
            .iter()
            .find(|a| AudioTranscriber::is_supported(&a.filename))
            .map(|a| (a.url.as_str(), a.filename.as_str()))
    }

    async fn send_reply(&self, ctx: &Context, msg: &Message, reply: &str) {
        for chunk in chunk_for_message(reply) {
            if let Err(why) = msg.channel_id.say(&ctx.http, chunk).await {
                error!("Failed to send reply: {why}");
                return;
            }
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        // The owner key doubles as the delivery channel for reminders.
        let owner = msg.channel_id.to_string();

        let reply = if let Some((url, filename)) = Self::audio_attachment(&msg) {
            self.command_handler
                .handle_voice(&owner, url, filename)
                .await
        } else {
            let content = msg.content.trim();
            if content.is_empty() {
                return;
            }
            self.command_handler.handle_text(&owner, content).await
        };

        self.send_reply(&ctx, &msg, &reply).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::MessageComponent(component) = interaction {
            if let Err(e) = self
                .component_handler
                .handle_component_interaction(&ctx, &component)
                .await
            {
                error!(
                    "Error handling component interaction '{}': {}",
                    component.data.custom_id, e
                );

                let error_message =
                    "❌ Sorry, I encountered an error processing your interaction. Please try again.";

                // Try to update the message, fallback to new response if that fails
                #[allow(clippy::redundant_pattern_matching)]
                if let Err(_) = component
                    .create_interaction_response(&ctx.http, |response| {
                        response
                            .kind(serenity::model::application::interaction::InteractionResponseType::UpdateMessage)
                            .interaction_response_data(|message| message.content(error_message))
                    })
                    .await
                {
                    let _ = component
                        .create_interaction_response(&ctx.http, |response| {
                            response
                                .kind(serenity::model::application::interaction::InteractionResponseType::ChannelMessageWithSource)
                                .interaction_response_data(|message| message.content(error_message))
                        })
                        .await;
                }
            }
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    // The openai crate reads its key from env vars, not from our config.
    // Set both OPENAI_API_KEY and OPENAI_KEY for compatibility.
    std::env::set_var("OPENAI_API_KEY", &config.openai_api_key);
    std::env::set_var("OPENAI_KEY", &config.openai_api_key);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting Jarvis assistant bot...");

    let database = Database::new(&config.database_path)?;
    let store: Arc<dyn ReminderStore> = Arc::new(database);

    let oracle = Arc::new(OpenAiOracle::new(config.openai_model.clone()));
    let transcriber = Arc::new(AudioTranscriber::new(config.openai_api_key.clone()));

    let command_handler = CommandHandler::new(oracle, store.clone(), transcriber);
    let actions = ActionEngine::new(store.clone(), config.snooze_minutes);
    let component_handler = MessageComponentHandler::new(actions);

    let handler = Handler::new(command_handler, component_handler);

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Bot configured successfully. Connecting to Discord gateway...");

    // Start the reminder scheduler against the live gateway connection
    let notifier = Arc::new(DiscordNotifier::new(client.cache_and_http.http.clone()));
    let scheduler = ReminderScheduler::new(
        store,
        notifier,
        Duration::from_secs(config.poll_interval_seconds),
    );
    tokio::spawn(async move {
        scheduler.run().await;
    });

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
