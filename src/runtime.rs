//! Runtime services and shared state for herald-bot.

use tokio::sync::mpsc;
use tracing::{Instrument, error, info, instrument};

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    bots::{Bot, echo::EchoBot, event::EventBot, help::HelpBot, ping::PingBot},
    dispatch::Dispatcher,
    reminder::{Reminder, scheduler::ReminderScheduler},
    service::{chat::ChatClient, db::DbClient, mail::MailClient},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the service clients, the registered bots and the configuration.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The event store.
    pub db: DbClient,
    /// The digest sender shared by the scheduler and the event bot.
    pub reminder: Reminder,
    /// The enabled bots, in dispatch order.
    pub dispatcher: Dispatcher,
    /// The chat client instance.
    pub chat: ChatClient,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the database.
        let db = DbClient::surreal(&config).await?;

        // Initialize the mail transport.
        let mail = MailClient::smtp(&config)?;

        // Initialize the slack client.
        let chat = ChatClient::slack(&config).await?;

        Self::with_clients(config, db, mail, chat)
    }

    /// Wires the bots around already constructed clients.
    pub fn with_clients(config: Config, db: DbClient, mail: MailClient, chat: ChatClient) -> Res<Self> {
        let reminder = Reminder::new(&config, db.clone(), mail)?;
        let dispatcher = Dispatcher::new(build_bots(&config, &reminder));

        info!("Registered bots: {}", dispatcher.bots().iter().map(|b| b.name()).collect::<Vec<_>>().join(", "));

        Ok(Self {
            config,
            db,
            reminder,
            dispatcher,
            chat,
        })
    }

    /// Runs the digest scheduler (when the event bot is enabled) and the dispatch loop, then the chat
    /// listener until it returns.
    pub async fn start(&self) -> Void {
        // The digest belongs to the event bot; without it nothing is mailed.
        if self.config.event_bot_enabled {
            let scheduler = ReminderScheduler::new(self.reminder.clone(), &self.config.reminder_schedule)?;
            scheduler.spawn();
        }

        let (tx, rx) = mpsc::unbounded_channel();

        let dispatcher = self.dispatcher.clone();
        let chat = self.chat.clone();
        tokio::spawn(dispatcher.run(chat, rx).in_current_span());

        let result = self.chat.start(tx).await;

        if let Err(err) = &result {
            error!("Chat listener stopped: {:#}", err);
        }

        result
    }
}

/// The enabled bots: echo, ping and event first, then help describing them.
fn build_bots(config: &Config, reminder: &Reminder) -> Vec<Bot> {
    let mut bots: Vec<Bot> = Vec::new();

    if config.echo_bot_enabled {
        bots.push(EchoBot::new("Echobot").into());
    }

    if config.ping_bot_enabled {
        bots.push(PingBot::new("Pingbot").into());
    }

    if config.event_bot_enabled {
        bots.push(EventBot::new("Eventbot", &config.owner_nick, &config.owner_email_address, reminder.clone()).into());
    }

    if config.help_bot_enabled {
        let help = HelpBot::new("Helpbot", bots.clone());
        bots.push(help.into());
    }

    bots
}
