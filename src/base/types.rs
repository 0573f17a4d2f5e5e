use serde::{Deserialize, Serialize};

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

/// Prefix that marks a destination as a shared channel.
pub const CHANNEL_SIGIL: char = '#';

/// Whether an inbound message was addressed to a channel or directly to the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Channel,
    Query,
}

/// A message received from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Where the message was posted; channel-form if it starts with [`CHANNEL_SIGIL`].
    pub channel: String,
    /// Nickname (or user id) of the author.
    pub sender: String,
    /// Raw message body.
    pub text: String,
}

impl InboundMessage {
    pub fn new(channel: impl Into<String>, sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            sender: sender.into(),
            text: text.into(),
        }
    }

    /// Classifies the message by the first character of its channel.
    pub fn kind(&self) -> EventKind {
        if self.channel.starts_with(CHANNEL_SIGIL) { EventKind::Channel } else { EventKind::Query }
    }

    pub fn is_channel_event(&self) -> bool {
        self.kind() == EventKind::Channel
    }
}

/// A single reply line headed for the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub destination: String,
    pub text: String,
}

impl OutboundMessage {
    pub fn new(destination: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            text: text.into(),
        }
    }
}

/// Turns a list of lines into one outbound message per line, all to the same destination.
pub fn reply_lines<I, S>(destination: &str, lines: I) -> Vec<OutboundMessage>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    lines.into_iter().map(|line| OutboundMessage::new(destination, line)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_by_sigil() {
        assert_eq!(InboundMessage::new("#general", "alice", "hi").kind(), EventKind::Channel);
        assert_eq!(InboundMessage::new("herald", "alice", "hi").kind(), EventKind::Query);
        assert_eq!(InboundMessage::new("", "alice", "hi").kind(), EventKind::Query);
        assert!(!InboundMessage::new("general#", "alice", "hi").is_channel_event());
    }

    #[test]
    fn test_reply_lines_keeps_order() {
        let replies = reply_lines("#general", ["one", "two"]);

        assert_eq!(replies, vec![OutboundMessage::new("#general", "one"), OutboundMessage::new("#general", "two")]);
    }
}
