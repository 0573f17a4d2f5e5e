//! Command handlers ("bots") that the dispatcher feeds every inbound message to.
//!
//! Each bot recognizes its own commands and ignores everything else by
//! returning no replies. The dispatcher does not know concrete bot types; it
//! only sees [`Bot`] values in registration order.

pub mod echo;
pub mod event;
pub mod help;
pub mod ping;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{InboundMessage, OutboundMessage, Res};

// Traits.

/// Generic bot trait that every command handler implements.
#[async_trait]
pub trait GenericBot: Send + Sync + 'static {
    /// Stable name used in logs and in the aggregated help listing.
    fn name(&self) -> &str;

    /// Help lines describing the bot's commands. Returns the same value on every call.
    fn help_lines(&self) -> Vec<String>;

    /// Handles a message posted to a channel.
    ///
    /// Returns no replies (and no error) when the message is not meant for this bot.
    async fn process_channel_event(&self, msg: &InboundMessage) -> Res<Vec<OutboundMessage>>;

    /// Handles a message sent directly to the bot.
    ///
    /// Bots without direct message behavior return a [`not_implemented`] error.
    async fn process_query_event(&self, msg: &InboundMessage) -> Res<Vec<OutboundMessage>>;
}

// Structs.

/// A registered bot.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Bot {
    inner: Arc<dyn GenericBot>,
}

impl Deref for Bot {
    type Target = dyn GenericBot;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl Bot {
    pub fn new(inner: Arc<dyn GenericBot>) -> Self {
        Self { inner }
    }
}

impl<B: GenericBot> From<B> for Bot {
    fn from(bot: B) -> Self {
        Self { inner: Arc::new(bot) }
    }
}

/// The error a bot returns for a kind of event it does not handle.
pub fn not_implemented(bot_name: &str, what: &str) -> anyhow::Error {
    anyhow::anyhow!("{} does not implement {} handling", bot_name, what)
}
