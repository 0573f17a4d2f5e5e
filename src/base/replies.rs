//! Fixed chat replies and command words used by the bots.

/// Prefix shared by all event bot commands.
pub const EVENT_PREFIX: &str = "!event";

pub const EVENT_CMD_HELP: &str = "help";
pub const EVENT_CMD_ADD: &str = "add";
pub const EVENT_CMD_UPCOMING: &str = "upcoming";
pub const EVENT_CMD_LIST: &str = "list";
pub const EVENT_CMD_TODAY: &str = "today";
pub const EVENT_CMD_DELETE: &str = "del";
pub const EVENT_CMD_MAILTEST: &str = "mailtest";
pub const EVENT_CMD_MAILREMINDER: &str = "mailreminder";

/// Input format for `!event add`, e.g. `01.01.2016-16:00`.
pub const EVENT_TIME_FORMAT: &str = "%d.%m.%Y-%H:%M";

/// Display format for a stored event, e.g. `Fri 1 Jan 2016, 16:00`.
pub const EVENT_DISPLAY_FORMAT: &str = "%a %-d %b %Y, %H:%M";

pub const EVENT_HELP_TEXT: &str = "* !event help - this text
* !event add <date> <description> - add an event
* !event list - list all upcoming events (with id)
* !event del <id> - remove the event with the given id
* !event today - show all events today";

pub const EVENT_INVALID_TIME_FORMAT: &str = "Invalid time format, use e.g.  01.01.2016-16:00";
pub const EVENT_INVALID_COMMAND: &str = "invalid command - see !event help.";
pub const EVENT_ADD_SUCCESS: &str = "Recorded new event.";
pub const EVENT_LIST_NONE_AVAILABLE: &str = "no upcoming events.";
pub const EVENT_TODAY_NONE_AVAILABLE: &str = "no events today.";
pub const EVENT_UNKNOWN: &str = "Unknown event.";
pub const EVENT_NOT_AUTHORIZED: &str = "Only my owner can do this.";
pub const EVENT_MAILTEST_REPLY: &str = "Attempted to send test mail.";
pub const EVENT_MAILREMINDER_REPLY: &str = "Attempted to send a reminder mail.";
pub const EVENT_MAILREMINDER_SEND_ERROR: &str = "Failed to send reminder email, check log.";
pub const EVENT_MAILREMINDER_NONE_AVAILABLE: &str = "No events for today found, not sending.";

/// Reply for a successful `!event del <id>`.
pub fn event_deleted(id: i64) -> String {
    format!("Event {id} deleted.")
}

/// Second line of the invalid time format reply.
pub fn event_parse_error(err: impl std::fmt::Display) -> String {
    format!("Error was: {err}")
}

pub const PING_COMMAND: &str = "!ping";
pub const PING_REPLY: &str = "PONG";
pub const PING_HELP_TEXT: &str = "* !ping - check whether I am alive";

pub const ECHO_PREFIX: &str = "!echo";
pub const ECHO_HELP_TEXT: &str = "* !echo <text> - repeat <text> back to you";

pub const HELP_COMMAND: &str = "!help";
pub const HELP_HELP_TEXT: &str = "!help prints the help texts of all available bots.";
pub const HELP_ATTRIBUTION: &str = "Find my code at https://github.com/gonium/her0ld";

/// Header line the help bot emits before each bot's help lines.
pub fn help_header(bot_name: &str) -> String {
    format!("{bot_name} commands:")
}

pub const MAILTEST_SUBJECT: &str = "herald-bot mail test";
pub const MAILTEST_BODY: &str = "Testing mail. If you can read this everything should be working.";
