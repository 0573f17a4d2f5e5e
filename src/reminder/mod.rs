//! The daily event digest.
//!
//! [`Reminder::send_digest`] is the single code path that collects today's and
//! later events and mails them. Both the cron-driven [`scheduler`] and the
//! `!event mailreminder` command go through it.

pub mod digest;
pub mod scheduler;

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{error, info, instrument};

use crate::{
    base::{
        config::Config,
        replies::{EVENT_MAILREMINDER_NONE_AVAILABLE, EVENT_MAILREMINDER_REPLY, EVENT_MAILREMINDER_SEND_ERROR},
        types::Res,
    },
    service::{
        db::{DbClient, sort_by_start},
        mail::MailClient,
    },
};

use digest::DigestMail;

/// Outcome of one digest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestStatus {
    /// Nothing happens today, so no mail was sent.
    NoEventToday,
    /// The digest could not be built or delivered.
    SendError,
    SendSuccess,
}

impl DigestStatus {
    /// The chat line reported back for `!event mailreminder`.
    pub fn reply(&self) -> &'static str {
        match self {
            DigestStatus::NoEventToday => EVENT_MAILREMINDER_NONE_AVAILABLE,
            DigestStatus::SendError => EVENT_MAILREMINDER_SEND_ERROR,
            DigestStatus::SendSuccess => EVENT_MAILREMINDER_REPLY,
        }
    }
}

impl fmt::Display for DigestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reply())
    }
}

/// Everything needed to build and send the digest.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Reminder {
    pub db: DbClient,
    pub mail: MailClient,
    pub tz: Tz,
    pub recipient: String,
    pub subject: String,
}

impl Reminder {
    pub fn new(config: &Config, db: DbClient, mail: MailClient) -> Res<Self> {
        Ok(Self {
            db,
            mail,
            tz: config.tz()?,
            recipient: config.mail_recipient_address.clone(),
            subject: config.mail_subject.clone(),
        })
    }

    /// Mails today's events, plus everything after today, to the digest recipient.
    ///
    /// Failures are logged and reported as [`DigestStatus::SendError`]; nothing is retried.
    #[instrument(skip(self))]
    pub async fn send_digest(&self, now: DateTime<Utc>) -> DigestStatus {
        match self.try_send_digest(now).await {
            Ok(status) => status,
            Err(err) => {
                error!("Failed to send the event digest: {:#}", err);
                DigestStatus::SendError
            }
        }
    }

    async fn try_send_digest(&self, now: DateTime<Utc>) -> Res<DigestStatus> {
        let (start_of_today, start_of_tomorrow) = day_bounds(&self.tz, now);

        let today = self.db.find_events_in_range(start_of_today, start_of_tomorrow).await?;
        if today.is_empty() {
            return Ok(DigestStatus::NoEventToday);
        }

        let mut upcoming = self.db.find_events_after(start_of_tomorrow).await?;
        sort_by_start(&mut upcoming);

        let message = DigestMail {
            from: self.mail.from_address(),
            to: &self.recipient,
            subject: &self.subject,
            now,
            today: &today,
            upcoming: &upcoming,
        }
        .render(&self.tz)?;

        self.mail.send_plaintext(&message, &self.recipient).await?;

        info!("Sent digest with {} events today and {} later.", today.len(), upcoming.len());

        Ok(DigestStatus::SendSuccess)
    }
}

// Helpers.

/// Start of the local day containing `now` and start of the next one, in UTC.
pub fn day_bounds(tz: &Tz, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.with_timezone(tz).date_naive();
    let tomorrow = today.succ_opt().unwrap_or(NaiveDate::MAX);

    (start_of_day(tz, today), start_of_day(tz, tomorrow))
}

/// Local midnight; on days where midnight is skipped by a DST change, the first hour after it.
fn start_of_day(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);

    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + TimeDelta::hours(1))).earliest())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono_tz::Europe::Berlin;

    use super::*;
    use crate::service::mail::mock::MockMail;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
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

    #[test]
    fn test_day_bounds_follow_timezone() {
        let (start, end) = day_bounds(&Berlin, at("2030-01-01T23:30:00Z"));

        assert_eq!(start, at("2030-01-01T23:00:00Z"));
        assert_eq!(end, at("2030-01-02T23:00:00Z"));
    }

    #[test]
    fn test_day_bounds_across_dst_change() {
        let (start, end) = day_bounds(&Berlin, at("2030-03-31T12:00:00Z"));

        assert_eq!(start, at("2030-03-30T23:00:00Z"));
        assert_eq!(end, at("2030-03-31T22:00:00Z"));
    }

    #[tokio::test]
    async fn test_no_mail_without_events_today() {
        let mut mail = MockMail::new();
        mail.expect_send_plaintext().never();

        let reminder = reminder_with(mail).await;
        reminder.db.create_event(at("2030-01-10T18:00:00Z"), "later").await.unwrap();

        assert_eq!(reminder.send_digest(at("2030-01-01T08:00:00Z")).await, DigestStatus::NoEventToday);
    }

    #[tokio::test]
    async fn test_sends_digest_to_recipient() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let sent_clone = sent.clone();

        let mut mail = MockMail::new();
        mail.expect_from_address().return_const("herald@example.com".to_string());
        mail.expect_send_plaintext().times(1).returning(move |message, recipient| {
            sent_clone.lock().unwrap().push((message.to_string(), recipient.to_string()));
            Ok(())
        });

        let reminder = reminder_with(mail).await;
        reminder.db.create_event(at("2030-01-12T18:00:00Z"), "much later").await.unwrap();
        reminder.db.create_event(at("2030-01-01T18:00:00Z"), "party").await.unwrap();
        reminder.db.create_event(at("2030-01-05T18:00:00Z"), "hackathon").await.unwrap();
        reminder.db.create_event(at("2029-12-31T18:00:00Z"), "yesterday").await.unwrap();

        assert_eq!(reminder.send_digest(at("2030-01-01T08:00:00Z")).await, DigestStatus::SendSuccess);

        let sent = sent.lock().unwrap();
        let (message, recipient) = &sent[0];

        assert_eq!(recipient, "events@example.com");
        assert!(message.contains("party"));
        assert!(!message.contains("yesterday"));

        let hackathon = message.find("hackathon").unwrap();
        let much_later = message.find("much later").unwrap();
        assert!(hackathon < much_later);
    }

    #[tokio::test]
    async fn test_reports_send_errors() {
        let mut mail = MockMail::new();
        mail.expect_from_address().return_const("herald@example.com".to_string());
        mail.expect_send_plaintext().times(1).returning(|_, _| Err(anyhow::anyhow!("relay unavailable")));

        let reminder = reminder_with(mail).await;
        reminder.db.create_event(at("2030-01-01T18:00:00Z"), "party").await.unwrap();

        let status = reminder.send_digest(at("2030-01-01T08:00:00Z")).await;

        assert_eq!(status, DigestStatus::SendError);
        assert_eq!(status.reply(), EVENT_MAILREMINDER_SEND_ERROR);
    }
}
