//! Slack socket mode implementation of the chat client.

use crate::base::{
    config::Config,
    types::{CHANNEL_SIGIL, InboundMessage, Res, Void},
};
use async_trait::async_trait;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use slack_morphism::prelude::*;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

use std::sync::Arc;

use super::{ChatClient, GenericChatClient};

// Type aliases.

type FullClient = slack_morphism::SlackClient<SlackClientHyperConnector<HttpsConnector<HttpConnector>>>;

/// Slack's channel type for direct messages.
const DIRECT_MESSAGE_CHANNEL_TYPE: &str = "im";

// Extra methods on `ChatClient` applied by the slack implementation.

impl ChatClient {
    /// Creates a new Slack chat client.
    pub async fn slack(config: &Config) -> Res<Self> {
        let client = SlackChatClient::new(config).await?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Structs.

/// User state for the slack socket client.
struct SlackUserState {
    inbound: UnboundedSender<InboundMessage>,
    bot_user_id: String,
}

/// Slack client implementation.
#[derive(Clone)]
struct SlackChatClient {
    app_token: SlackApiToken,
    bot_token: SlackApiToken,
    bot_user_id: String,
    client: Arc<FullClient>,
}

impl SlackChatClient {
    /// Create a new Slack chat client.
    #[instrument(name = "SlackChatClient::new", skip_all)]
    pub async fn new(config: &Config) -> Res<Self> {
        // Initialize tokens.

        let app_token = SlackApiToken::new(SlackApiTokenValue(config.slack_app_token.clone()));
        let bot_token = SlackApiToken::new(SlackApiTokenValue(config.slack_bot_token.clone()));

        // Initialize the Slack client.

        let https_connector = HttpsConnector::<HttpConnector>::builder().with_native_roots()?.https_only().enable_all_versions().build();
        let connector = SlackClientHyperConnector::with_connector(https_connector);
        let client = Arc::new(slack_morphism::SlackClient::new(connector));

        // Get the bot's user ID.

        let session = client.open_session(&bot_token);
        let bot_user = session.auth_test().await?;
        let bot_user_id = bot_user.user_id.0;

        info!("Slack bot user ID: {}", bot_user_id);

        Ok(Self {
            app_token,
            bot_token,
            bot_user_id,
            client,
        })
    }
}

#[async_trait]
impl GenericChatClient for SlackChatClient {
    fn bot_user_id(&self) -> &str {
        &self.bot_user_id
    }

    async fn start(&self, inbound: UnboundedSender<InboundMessage>) -> Void {
        // Initialize the socket mode listener.

        let socket_mode_callbacks = SlackSocketModeListenerCallbacks::new().with_push_events(handle_push_event);

        // Initialize the socket mode listener environment.

        let listener_environment = Arc::new(SlackClientEventsListenerEnvironment::new(self.client.clone()).with_user_state(SlackUserState {
            inbound,
            bot_user_id: self.bot_user_id.clone(),
        }));

        let socket_mode_listener = Arc::new(SlackClientSocketModeListener::new(
            &SlackClientSocketModeConfig::new(),
            listener_environment.clone(),
            socket_mode_callbacks,
        ));

        // Register an app token to listen for events,
        socket_mode_listener.listen_for(&self.app_token).await?;

        // Start WS connections calling Slack API to get WS url for the token,
        // and wait for Ctrl-C to shutdown.
        socket_mode_listener.serve().await;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn send_message(&self, destination: &str, text: &str) -> Void {
        let message = SlackMessageContent::new().with_text(text.to_string());

        let request = SlackApiChatPostMessageRequest::new(SlackChannelId(conversation_id(destination).to_string()), message);

        let session = self.client.open_session(&self.bot_token);

        let _ = session.chat_post_message(&request).await.map_err(|e| anyhow::anyhow!("Failed to send message: {}", e))?;

        Ok(())
    }
}

// Helpers.

/// Builds the inbound message for a Slack conversation.
///
/// Shared conversations get the channel sigil so the dispatcher treats them as
/// channel events; direct messages keep the bare conversation id.
fn to_inbound(channel_id: &str, channel_type: Option<&str>, sender: &str, text: &str) -> InboundMessage {
    let channel = if channel_type == Some(DIRECT_MESSAGE_CHANNEL_TYPE) { channel_id.to_string() } else { format!("{CHANNEL_SIGIL}{channel_id}") };

    InboundMessage::new(channel, sender, text)
}

/// Strips the channel sigil to get back the Slack conversation id.
fn conversation_id(destination: &str) -> &str {
    destination.strip_prefix(CHANNEL_SIGIL).unwrap_or(destination)
}

// Socket mode listener callbacks for Slack.

/// Handles push events from Slack.
#[instrument(skip_all)]
async fn handle_push_event(event_callback: SlackPushEventCallback, _client: Arc<SlackHyperClient>, states: SlackClientEventsUserState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let event = event_callback.event;
    let states = states.read().await;
    let user_state = states.get_user_state::<SlackUserState>().ok_or(anyhow::anyhow!("Failed to get user state"))?;

    match event {
        SlackEventCallbackBody::Message(slack_message_event) => {
            // Edits, joins and other subtypes are not chat lines.
            if slack_message_event.subtype.is_some() {
                debug!("Skipping message event with a subtype.");
                return Ok(());
            }

            // If the message is in a thread, skip, since the bots only answer top-level lines.
            if slack_message_event.origin.thread_ts.is_some() {
                debug!("Skipping message event because it is in a thread.");
                return Ok(());
            }

            if slack_message_event.sender.bot_id.is_some() {
                debug!("Skipping message event from a bot.");
                return Ok(());
            }

            let Some(sender) = slack_message_event.sender.user.as_ref().map(|u| u.0.as_str()) else {
                warn!("Skipping message event without a sender.");
                return Ok(());
            };

            if sender == user_state.bot_user_id {
                debug!("Skipping message event sent by myself.");
                return Ok(());
            }

            let Some(text) = slack_message_event.content.as_ref().and_then(|c| c.text.as_deref()) else {
                debug!("Skipping message event without text.");
                return Ok(());
            };

            let channel_id = slack_message_event.origin.channel.as_ref().ok_or(anyhow::anyhow!("Failed to get channel ID"))?;
            let channel_type = slack_message_event.origin.channel_type.as_ref().map(|t| t.0.as_str());

            user_state.inbound.send(to_inbound(&channel_id.0, channel_type, sender, text))?;
        }
        _ => {
            warn!("Received unhandled push event.")
        }
    }

    Ok(())
}

// Tests.
