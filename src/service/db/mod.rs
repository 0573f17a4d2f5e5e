pub mod surreal;

use std::{fmt::Write as _, ops::Deref, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::base::{replies::EVENT_DISPLAY_FORMAT, types::Res};

// Traits.

/// Generic database client trait that clients must implement.
///
/// This trait defines the event store used by the event bot and the digest
/// scheduler. Implementations must serialize their own mutations, since the
/// scheduler reads concurrently with command handling.
#[async_trait]
pub trait GenericDbClient: Send + Sync + 'static {
    /// Stores a new event under the next free id and returns it.
    ///
    /// Ids increase monotonically and are never handed out twice, even after deletion.
    async fn create_event(&self, start_time: DateTime<Utc>, description: &str) -> Res<Event>;

    /// Returns all events with `from < start_time < to`, in store order.
    async fn find_events_in_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Res<Vec<Event>>;

    /// Returns all events with `from < start_time`, in store order.
    async fn find_events_after(&self, from: DateTime<Utc>) -> Res<Vec<Event>>;

    /// Removes the event with the given id, returning it if it existed.
    async fn delete_event(&self, id: i64) -> Res<Option<Event>>;

    /// Returns every stored event, in store order.
    async fn all_events(&self) -> Res<Vec<Event>>;

    /// Returns all events that start after `now`.
    async fn find_upcoming(&self, now: DateTime<Utc>) -> Res<Vec<Event>> {
        self.find_events_after(now).await
    }
}

// Structs.

/// Database client for herald-bot.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct DbClient {
    inner: Arc<dyn GenericDbClient>,
}

impl Deref for DbClient {
    type Target = dyn GenericDbClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl DbClient {
    pub fn new(inner: Arc<dyn GenericDbClient>) -> Self {
        Self { inner }
    }
}

/// An upcoming event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub start_time: DateTime<Utc>,
    pub description: String,
}

impl Event {
    /// Renders the event as a single chat line, with the start time shown in `tz`.
    ///
    /// E.g. `(3) Fri 1 Jan 2016, 16:00 - party`.
    pub fn display<T>(&self, tz: &T) -> String
    where
        T: TimeZone,
        T::Offset: std::fmt::Display,
    {
        format!("({}) {} - {}", self.id, self.start_time.with_timezone(tz).format(EVENT_DISPLAY_FORMAT), self.description)
    }
}

/// Sorts events so the earliest comes first.
pub fn sort_by_start(events: &mut [Event]) {
    events.sort_by_key(|e| e.start_time);
}

/// Renders events one per line, as used in the digest mail.
pub fn display_events<T>(events: &[Event], tz: &T) -> String
where
    T: TimeZone,
    T::Offset: std::fmt::Display,
{
    let mut result = String::new();

    for (idx, event) in events.iter().enumerate() {
        if idx > 0 {
            result.push('\n');
        }
        let _ = write!(result, "{}", event.display(tz));
    }

    result
}
