//! Records upcoming events and mails reminders about them.
//!
//! Commands all start with `!event`; see [`EVENT_HELP_TEXT`] for the list.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::{Instrument, error, info, instrument};

use super::{GenericBot, not_implemented};
use crate::{
    base::{
        replies::*,
        types::{InboundMessage, OutboundMessage, Res, reply_lines},
    },
    reminder::{Reminder, day_bounds, digest::render_test_mail},
    service::db::sort_by_start,
};

pub struct EventBot {
    name: String,
    owner_nick: String,
    owner_email_address: String,
    reminder: Reminder,
    messages_handled: AtomicUsize,
}

impl EventBot {
    pub fn new(name: impl Into<String>, owner_nick: impl Into<String>, owner_email_address: impl Into<String>, reminder: Reminder) -> Self {
        Self {
            name: name.into(),
            owner_nick: owner_nick.into(),
            owner_email_address: owner_email_address.into(),
            reminder,
            messages_handled: AtomicUsize::new(0),
        }
    }

    pub fn messages_handled(&self) -> usize {
        self.messages_handled.load(Ordering::Relaxed)
    }

    fn is_from_owner(&self, msg: &InboundMessage) -> bool {
        msg.sender == self.owner_nick
    }

    /// Runs the command in `msg`, returning the reply lines.
    ///
    /// `None` means the message is not an event command at all.
    async fn handle(&self, msg: &InboundMessage, now: DateTime<Utc>) -> Res<Option<Vec<String>>> {
        let text = msg.text.as_str();
        let is = |cmd: &str| text.strip_prefix(EVENT_PREFIX).and_then(|rest| rest.strip_prefix(' ')).is_some_and(|rest| rest.starts_with(cmd));

        let lines = if is(EVENT_CMD_HELP) {
            EVENT_HELP_TEXT.lines().map(String::from).collect()
        } else if is(EVENT_CMD_ADD) {
            self.add(text).await?
        } else if is(EVENT_CMD_UPCOMING) || is(EVENT_CMD_LIST) {
            self.upcoming(now).await?
        } else if is(EVENT_CMD_TODAY) {
            self.today(now).await?
        } else if is(EVENT_CMD_DELETE) {
            self.delete(text).await?
        } else if is(EVENT_CMD_MAILTEST) {
            self.mailtest(msg, now)
        } else if is(EVENT_CMD_MAILREMINDER) {
            self.mailreminder(msg, now).await
        } else if text.starts_with(EVENT_PREFIX) {
            vec![EVENT_INVALID_COMMAND.to_string()]
        } else {
            return Ok(None);
        };

        Ok(Some(lines))
    }

    async fn add(&self, text: &str) -> Res<Vec<String>> {
        let request: Vec<&str> = text.split(' ').collect();

        let start_time = match self.parse_start_time(request.get(2).copied()) {
            Ok(start_time) => start_time,
            Err(err) => return Ok(vec![EVENT_INVALID_TIME_FORMAT.to_string(), event_parse_error(err)]),
        };

        let description = request.get(3..).unwrap_or_default().join(" ");
        let event = self.reminder.db.create_event(start_time, &description).await?;

        info!("Recorded event {} at {}.", event.id, event.start_time);

        Ok(vec![EVENT_ADD_SUCCESS.to_string()])
    }

    /// Parses `DD.MM.YYYY-HH:MM` as a local time in the configured time zone.
    fn parse_start_time(&self, date: Option<&str>) -> Res<DateTime<Utc>> {
        let date = date.filter(|d| !d.is_empty()).ok_or_else(|| anyhow::anyhow!("missing date"))?;
        let naive = NaiveDateTime::parse_from_str(date, EVENT_TIME_FORMAT)?;

        let local = self
            .reminder
            .tz
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| anyhow::anyhow!("{} is not a unique local time in {}", date, self.reminder.tz))?;

        Ok(local.with_timezone(&Utc))
    }

    async fn upcoming(&self, now: DateTime<Utc>) -> Res<Vec<String>> {
        let mut events = self.reminder.db.find_upcoming(now).await?;

        if events.is_empty() {
            return Ok(vec![EVENT_LIST_NONE_AVAILABLE.to_string()]);
        }

        sort_by_start(&mut events);

        Ok(events.iter().map(|e| e.display(&self.reminder.tz)).collect())
    }

    async fn today(&self, now: DateTime<Utc>) -> Res<Vec<String>> {
        let (start, end) = day_bounds(&self.reminder.tz, now);
        let events = self.reminder.db.find_events_in_range(start, end).await?;

        if events.is_empty() {
            return Ok(vec![EVENT_TODAY_NONE_AVAILABLE.to_string()]);
        }

        Ok(events.iter().map(|e| e.display(&self.reminder.tz)).collect())
    }

    async fn delete(&self, text: &str) -> Res<Vec<String>> {
        let Some(id) = text.split(' ').nth(2).and_then(|id| id.parse::<i64>().ok()) else {
            return Ok(vec![EVENT_UNKNOWN.to_string()]);
        };

        let reply = match self.reminder.db.delete_event(id).await? {
            Some(event) => {
                info!("Deleted event {}.", event.id);
                event_deleted(event.id)
            }
            None => EVENT_UNKNOWN.to_string(),
        };

        Ok(vec![reply])
    }

    fn mailtest(&self, msg: &InboundMessage, now: DateTime<Utc>) -> Vec<String> {
        if !self.is_from_owner(msg) {
            return vec![EVENT_NOT_AUTHORIZED.to_string()];
        }

        let mail = self.reminder.mail.clone();
        let recipient = self.owner_email_address.clone();
        let tz = self.reminder.tz;

        tokio::spawn(
            async move {
                let result = match render_test_mail(mail.from_address(), &recipient, now, &tz) {
                    Ok(message) => mail.send_plaintext(&message, &recipient).await,
                    Err(err) => Err(err),
                };

                match result {
                    Ok(()) => info!("Sent test mail to {}.", recipient),
                    Err(err) => error!("Failed to send test mail to {}: {:#}", recipient, err),
                }
            }
            .in_current_span(),
        );

        vec![EVENT_MAILTEST_REPLY.to_string()]
    }

    async fn mailreminder(&self, msg: &InboundMessage, now: DateTime<Utc>) -> Vec<String> {
        if !self.is_from_owner(msg) {
            return vec![EVENT_NOT_AUTHORIZED.to_string()];
        }

        let status = self.reminder.send_digest(now).await;

        vec![status.reply().to_string()]
    }
}

#[async_trait]
impl GenericBot for EventBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn help_lines(&self) -> Vec<String> {
        EVENT_HELP_TEXT.lines().map(String::from).collect()
    }

    #[instrument(skip_all, fields(bot = %self.name))]
    async fn process_channel_event(&self, msg: &InboundMessage) -> Res<Vec<OutboundMessage>> {
        self.messages_handled.fetch_add(1, Ordering::Relaxed);

        let lines = self.handle(msg, Utc::now()).await?.unwrap_or_default();

        Ok(reply_lines(&msg.channel, lines))
    }

    async fn process_query_event(&self, _msg: &InboundMessage) -> Res<Vec<OutboundMessage>> {
        Err(not_implemented(&self.name, "query event"))
    }
}
