//! Mail bodies rendered from the templates in `templates/`.

use askama::Template;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::{
    base::{
        replies::{MAILTEST_BODY, MAILTEST_SUBJECT},
        types::Res,
    },
    service::db::{Event, display_events},
};

#[derive(Template)]
#[template(path = "digest.txt")]
struct DigestTemplate<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    date: String,
    today_events: String,
    upcoming_events: String,
}

#[derive(Template)]
#[template(path = "mailtest.txt")]
struct TestMailTemplate<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    date: String,
    body: &'a str,
}

/// Headers and body of a digest mail.
pub struct DigestMail<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub subject: &'a str,
    pub now: DateTime<Utc>,
    pub today: &'a [Event],
    pub upcoming: &'a [Event],
}

impl DigestMail<'_> {
    /// Renders the full message, headers included, with CRLF line endings.
    pub fn render(&self, tz: &Tz) -> Res<String> {
        let template = DigestTemplate {
            from: self.from,
            to: self.to,
            subject: self.subject,
            date: self.now.with_timezone(tz).to_rfc2822(),
            today_events: display_events(self.today, tz),
            upcoming_events: display_events(self.upcoming, tz),
        };

        Ok(to_crlf(&template.render()?))
    }
}

/// Renders the fixed test mail sent by `!event mailtest`.
pub fn render_test_mail(from: &str, to: &str, now: DateTime<Utc>, tz: &Tz) -> Res<String> {
    let template = TestMailTemplate {
        from,
        to,
        subject: MAILTEST_SUBJECT,
        date: now.with_timezone(tz).to_rfc2822(),
        body: MAILTEST_BODY,
    };

    Ok(to_crlf(&template.render()?))
}

fn to_crlf(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join("\r\n") + "\r\n"
}

#[cfg(test)]
mod tests {
    use chrono_tz::Europe::Berlin;

    use super::*;

    fn event(id: i64, start: &str, description: &str) -> Event {
        Event {
            id,
            start_time: DateTime::parse_from_rfc3339(start).unwrap().with_timezone(&Utc),
            description: description.to_string(),
        }
    }

    #[test]
    fn test_digest_lists_today_and_upcoming() {
        let today = [event(1, "2030-01-01T18:00:00Z", "party")];
        let upcoming = [event(2, "2030-01-05T18:00:00Z", "hackathon")];
        let mail = DigestMail {
            from: "herald@example.com",
            to: "events@example.com",
            subject: "Reminder",
            now: DateTime::parse_from_rfc3339("2030-01-01T01:00:00Z").unwrap().with_timezone(&Utc),
            today: &today,
            upcoming: &upcoming,
        };

        let message = mail.render(&Berlin).unwrap();

        assert!(message.starts_with("From: herald@example.com\r\nTo: events@example.com\r\nSubject: Reminder\r\nDate: Tue, "));
        assert!(message.contains("Jan 2030 02:00:00 +0100\r\n"));
        assert!(message.contains("(1) Tue 1 Jan 2030, 19:00 - party"));
        assert!(message.contains("Other upcoming events:"));
        assert!(message.contains("(2) Sat 5 Jan 2030, 19:00 - hackathon"));
        assert!(!message.contains("\r\r"));
    }

    #[test]
    fn test_digest_without_upcoming_events() {
        let today = [event(1, "2030-01-01T18:00:00Z", "party")];
        let mail = DigestMail {
            from: "herald@example.com",
            to: "events@example.com",
            subject: "Reminder",
            now: Utc::now(),
            today: &today,
            upcoming: &[],
        };

        let message = mail.render(&Berlin).unwrap();

        assert!(message.contains("Nothing else is planned yet."));
        assert!(!message.contains("Other upcoming events:"));
    }

    #[test]
    fn test_test_mail_has_headers_and_body() {
        let message = render_test_mail("herald@example.com", "owner@example.com", Utc::now(), &Berlin).unwrap();

        assert!(message.starts_with("From: herald@example.com\r\nTo: owner@example.com\r\nSubject: herald-bot mail test\r\n"));
        assert!(message.contains(MAILTEST_BODY));
    }
}
