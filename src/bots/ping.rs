//! Replies `PONG` to `!ping`.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{GenericBot, not_implemented};
use crate::base::{
    replies::{PING_COMMAND, PING_HELP_TEXT, PING_REPLY},
    types::{InboundMessage, OutboundMessage, Res},
};

pub struct PingBot {
    name: String,
    messages_handled: AtomicUsize,
}

impl PingBot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages_handled: AtomicUsize::new(0),
        }
    }

    /// Number of `!ping` commands answered so far.
    pub fn messages_handled(&self) -> usize {
        self.messages_handled.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl GenericBot for PingBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn help_lines(&self) -> Vec<String> {
        vec![PING_HELP_TEXT.to_string()]
    }

    async fn process_channel_event(&self, msg: &InboundMessage) -> Res<Vec<OutboundMessage>> {
        if !msg.text.eq_ignore_ascii_case(PING_COMMAND) {
            return Ok(Vec::new());
        }

        self.messages_handled.fetch_add(1, Ordering::Relaxed);

        Ok(vec![OutboundMessage::new(&msg.channel, PING_REPLY)])
    }

    async fn process_query_event(&self, _msg: &InboundMessage) -> Res<Vec<OutboundMessage>> {
        Err(not_implemented(&self.name, "query event"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ignores_non_command_messages() {
        let bot = PingBot::new("Pingbot");

        for text in ["djewoijdowe", "foobar", "!pingoooo", "ping"] {
            let replies = bot.process_channel_event(&InboundMessage::new("#test", "testnick", text)).await.unwrap();
            assert!(replies.is_empty(), "should ignore `{text}`");
        }

        assert_eq!(bot.messages_handled(), 0);
    }

    #[tokio::test]
    async fn test_answers_ping_in_any_case() {
        let bot = PingBot::new("Pingbot");

        for text in ["!ping", "!PING"] {
            let replies = bot.process_channel_event(&InboundMessage::new("#test", "testnick", text)).await.unwrap();
            assert_eq!(replies, vec![OutboundMessage::new("#test", "PONG")]);
        }

        assert_eq!(bot.messages_handled(), 2);
    }

    #[tokio::test]
    async fn test_query_events_are_not_implemented() {
        let bot = PingBot::new("Pingbot");

        assert!(bot.process_query_event(&InboundMessage::new("herald", "testnick", "!ping")).await.is_err());
    }
}
