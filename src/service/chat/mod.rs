pub mod slack;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::base::types::{InboundMessage, Void};

// Traits.

/// Generic "chat" trait that clients must implement.
///
/// This trait defines the core functionality for interacting with chat platforms
/// like Slack. Implementing this trait allows different chat services to be used
/// with the herald-bot.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Get the bot user ID.
    ///
    /// Returns the identity the bot currently has on the chat platform. Replies
    /// addressed to it are dropped before sending.
    fn bot_user_id(&self) -> &str;

    /// Start the chat client listener.
    ///
    /// Every inbound line is pushed into `inbound`, in arrival order. Returns
    /// once the listener shuts down.
    async fn start(&self, inbound: UnboundedSender<InboundMessage>) -> Void;

    /// Send a single line to a channel or user.
    async fn send_message(&self, destination: &str, text: &str) -> Void;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}
