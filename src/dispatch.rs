//! Fans inbound messages out to the registered bots and sends their replies.

use tokio::sync::mpsc::UnboundedReceiver;

use crate::{base::types::EventKind, bots::Bot, prelude::*, service::chat::ChatClient};

/// Ordered set of bots that see every inbound message.
#[derive(Clone, Default)]
pub struct Dispatcher {
    bots: Vec<Bot>,
}

impl Dispatcher {
    pub fn new(bots: Vec<Bot>) -> Self {
        Self { bots }
    }

    /// Registers another bot; it runs after all bots registered before it.
    pub fn add(&mut self, bot: impl Into<Bot>) {
        self.bots.push(bot.into());
    }

    pub fn bots(&self) -> &[Bot] {
        &self.bots
    }

    /// Runs `msg` through every bot and collects the replies, in registration order.
    ///
    /// Bot errors are logged and skipped. Replies addressed to `own_identity` are dropped.
    #[instrument(skip_all, fields(channel = %msg.channel, sender = %msg.sender))]
    pub async fn dispatch(&self, msg: &InboundMessage, own_identity: &str) -> Vec<OutboundMessage> {
        let kind = msg.kind();
        let mut replies = Vec::new();

        for bot in &self.bots {
            let result = match kind {
                EventKind::Channel => bot.process_channel_event(msg).await,
                EventKind::Query => bot.process_query_event(msg).await,
            };

            match result {
                Ok(lines) => replies.extend(lines),
                Err(err) => error!("{} failed on `{}`: {:#}", bot.name(), msg.text, err),
            }
        }

        replies.retain(|reply| {
            let is_self = reply.destination == own_identity;
            if is_self {
                warn!("Dropping reply addressed to myself: {}", reply.text);
            }
            !is_self
        });

        replies
    }

    /// Handles inbound messages one at a time, in arrival order, until the queue closes.
    #[instrument(name = "dispatcher", skip_all)]
    pub async fn run(self, chat: ChatClient, mut inbound: UnboundedReceiver<InboundMessage>) {
        info!("Dispatching to {} bots.", self.bots.len());

        while let Some(msg) = inbound.recv().await {
            debug!("Inbound on {} from {}: {}", msg.channel, msg.sender, msg.text);

            for reply in self.dispatch(&msg, chat.bot_user_id()).await {
                if let Err(err) = chat.send_message(&reply.destination, &reply.text).await {
                    error!("Failed to send to {}: {:#}", reply.destination, err);
                }
            }
        }

        info!("Inbound queue closed; dispatcher stopping.");
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        base::types::Res,
        bots::{GenericBot, echo::EchoBot, not_implemented, ping::PingBot},
    };

    /// Replies with a fixed line to wherever it is told to.
    struct Fixed {
        name: &'static str,
        destination: &'static str,
    }

    #[async_trait]
    impl GenericBot for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn help_lines(&self) -> Vec<String> {
            Vec::new()
        }

        async fn process_channel_event(&self, _msg: &InboundMessage) -> Res<Vec<OutboundMessage>> {
            Ok(vec![OutboundMessage::new(self.destination, self.name)])
        }

        async fn process_query_event(&self, _msg: &InboundMessage) -> Res<Vec<OutboundMessage>> {
            Err(not_implemented(self.name, "query event"))
        }
    }

    fn fixed(name: &'static str, destination: &'static str) -> Fixed {
        Fixed { name, destination }
    }

    #[tokio::test]
    async fn test_replies_in_registration_order() {
        let mut dispatcher = Dispatcher::default();
        dispatcher.add(fixed("first", "#test"));
        dispatcher.add(fixed("second", "#test"));
        dispatcher.add(fixed("third", "#test"));

        let replies = dispatcher.dispatch(&InboundMessage::new("#test", "nick", "hi"), "UBOT").await;
        let texts: Vec<&str> = replies.iter().map(|r| r.text.as_str()).collect();

        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_drops_replies_to_self() {
        let dispatcher = Dispatcher::new(vec![fixed("loop", "UBOT").into(), fixed("fine", "#test").into()]);

        let replies = dispatcher.dispatch(&InboundMessage::new("#test", "nick", "hi"), "UBOT").await;

        assert_eq!(replies, vec![OutboundMessage::new("#test", "fine")]);
    }

    #[tokio::test]
    async fn test_errors_do_not_stop_other_bots() {
        let dispatcher = Dispatcher::new(vec![fixed("broken", "#test").into(), EchoBot::new("Echobot").into()]);

        let replies = dispatcher.dispatch(&InboundMessage::new("D42", "nick", "!echo hi"), "UBOT").await;

        assert_eq!(replies, vec![OutboundMessage::new("nick", "nick: hi")]);
        assert_eq!(dispatcher.bots().len(), 2);
    }

    #[tokio::test]
    async fn test_irrelevant_text_gets_no_replies() {
        let dispatcher = Dispatcher::new(vec![PingBot::new("Pingbot").into()]);

        assert!(dispatcher.dispatch(&InboundMessage::new("#test", "nick", "ordinary chat"), "UBOT").await.is_empty());
    }
}
