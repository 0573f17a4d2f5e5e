//! Fires the daily digest on a cron schedule evaluated in the configured time zone.

use std::str::FromStr;

use anyhow::Context;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use tokio::task::JoinHandle;
use tracing::{Instrument, info, instrument, warn};

use super::Reminder;
use crate::base::types::Res;

pub struct ReminderScheduler {
    reminder: Reminder,
    schedule: Schedule,
}

impl ReminderScheduler {
    /// Parses `expression` (seconds first, e.g. `0 0 1 * * *`) into a schedule for `reminder`.
    pub fn new(reminder: Reminder, expression: &str) -> Res<Self> {
        let schedule = Schedule::from_str(expression).with_context(|| format!("Invalid reminder schedule `{expression}`."))?;

        Ok(Self { reminder, schedule })
    }

    fn tz(&self) -> Tz {
        self.reminder.tz
    }

    /// The first firing strictly after `after`.
    pub fn next_fire(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after.with_timezone(&self.tz())).next().map(|t| t.with_timezone(&Utc))
    }

    /// Runs the schedule in the background until the runtime shuts down.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run().in_current_span())
    }

    #[instrument(name = "reminder_scheduler", skip(self))]
    async fn run(self) {
        loop {
            let now = Utc::now();

            let Some(next) = self.next_fire(now) else {
                warn!("Reminder schedule has no future firings; stopping.");
                return;
            };

            info!("Next digest at {}.", next.with_timezone(&self.tz()));

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            let status = self.reminder.send_digest(Utc::now()).await;
            info!("Scheduled digest finished: {}", status);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use chrono_tz::Europe::Berlin;
    use tokio::sync::mpsc;

    use super::*;
    use crate::service::{
        db::DbClient,
        mail::{MailClient, mock::MockMail},
    };

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    async fn reminder() -> Reminder {
        reminder_with(MockMail::new()).await
    }

    async fn reminder_with(mail: MockMail) -> Reminder {
        Reminder {
            db: DbClient::surreal_memory().await.unwrap(),
            mail: MailClient::new(Arc::new(mail)),
            tz: Berlin,
            recipient: "events@example.com".to_string(),
            subject: "Reminder".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fires_at_local_time() {
        let scheduler = ReminderScheduler::new(reminder().await, "0 0 1 * * *").unwrap();

        assert_eq!(scheduler.next_fire(at("2030-01-01T12:00:00Z")), Some(at("2030-01-02T00:00:00Z")));
        assert_eq!(scheduler.next_fire(at("2030-07-01T12:00:00Z")), Some(at("2030-07-01T23:00:00Z")));
    }

    #[tokio::test]
    async fn test_rejects_bad_expression() {
        assert!(ReminderScheduler::new(reminder().await, "every day").is_err());
    }

    #[tokio::test]
    async fn test_each_firing_sends_the_digest() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut mail = MockMail::new();
        mail.expect_from_address().return_const("herald@example.com".to_string());
        mail.expect_send_plaintext().returning(move |message, recipient| {
            let _ = tx.send((message.to_string(), recipient.to_string()));
            Ok(())
        });

        let reminder = reminder_with(mail).await;
        reminder.db.create_event(Utc::now(), "party").await.unwrap();

        let handle = ReminderScheduler::new(reminder, "* * * * * *").unwrap().spawn();

        // Two deliveries show the loop keeps going after the first firing.
        for _ in 0..2 {
            let (message, recipient) = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();

            assert_eq!(recipient, "events@example.com");
            assert!(message.contains("party"));
        }

        handle.abort();
    }
}
