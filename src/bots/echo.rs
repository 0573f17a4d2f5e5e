//! Repeats `!echo <text>` back, prefixed with the sender. Handy while developing.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::GenericBot;
use crate::base::{
    replies::{ECHO_HELP_TEXT, ECHO_PREFIX},
    types::{InboundMessage, OutboundMessage, Res},
};

pub struct EchoBot {
    name: String,
    messages_handled: AtomicUsize,
}

impl EchoBot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages_handled: AtomicUsize::new(0),
        }
    }

    pub fn messages_handled(&self) -> usize {
        self.messages_handled.load(Ordering::Relaxed)
    }

    /// Returns `<sender>: <text>` if the message is an echo command.
    fn echo(&self, msg: &InboundMessage) -> Option<String> {
        let rest = msg.text.strip_prefix(ECHO_PREFIX)?;
        let text = rest.strip_prefix(' ')?;

        self.messages_handled.fetch_add(1, Ordering::Relaxed);

        Some(format!("{}: {}", msg.sender, text))
    }
}

#[async_trait]
impl GenericBot for EchoBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn help_lines(&self) -> Vec<String> {
        vec![ECHO_HELP_TEXT.to_string()]
    }

    async fn process_channel_event(&self, msg: &InboundMessage) -> Res<Vec<OutboundMessage>> {
        Ok(self.echo(msg).map(|line| OutboundMessage::new(&msg.channel, line)).into_iter().collect())
    }

    async fn process_query_event(&self, msg: &InboundMessage) -> Res<Vec<OutboundMessage>> {
        Ok(self.echo(msg).map(|line| OutboundMessage::new(&msg.sender, line)).into_iter().collect())
    }
}
