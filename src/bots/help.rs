//! Lists the commands of every other bot on `!help`.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{Bot, GenericBot, not_implemented};
use crate::base::{
    replies::{HELP_ATTRIBUTION, HELP_COMMAND, HELP_HELP_TEXT, help_header},
    types::{InboundMessage, OutboundMessage, Res, reply_lines},
};

pub struct HelpBot {
    name: String,
    bots: Vec<Bot>,
    messages_handled: AtomicUsize,
}

impl HelpBot {
    /// Creates a help bot describing `bots`, in the given order.
    pub fn new(name: impl Into<String>, bots: Vec<Bot>) -> Self {
        Self {
            name: name.into(),
            bots,
            messages_handled: AtomicUsize::new(0),
        }
    }

    pub fn messages_handled(&self) -> usize {
        self.messages_handled.load(Ordering::Relaxed)
    }

    fn listing(&self) -> Vec<String> {
        let mut lines = Vec::new();

        for bot in &self.bots {
            lines.push(help_header(bot.name()));
            lines.extend(bot.help_lines());
        }

        lines.push(HELP_ATTRIBUTION.to_string());
        lines
    }
}

#[async_trait]
impl GenericBot for HelpBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn help_lines(&self) -> Vec<String> {
        vec![HELP_HELP_TEXT.to_string()]
    }

    async fn process_channel_event(&self, msg: &InboundMessage) -> Res<Vec<OutboundMessage>> {
        if !msg.text.eq_ignore_ascii_case(HELP_COMMAND) {
            return Ok(Vec::new());
        }

        self.messages_handled.fetch_add(1, Ordering::Relaxed);

        Ok(reply_lines(&msg.channel, self.listing()))
    }

    async fn process_query_event(&self, _msg: &InboundMessage) -> Res<Vec<OutboundMessage>> {
        Err(not_implemented(&self.name, "query event"))
    }
}
