//! SurrealDB implementation of the event store.

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::{
    Surreal,
    engine::any::{self, Any},
};
use tokio::sync::Mutex;
use tracing::{info, instrument};

use super::{DbClient, Event, GenericDbClient};
use crate::base::{config::Config, types::Res};

// Extra methods on `DbClient` applied by the surreal implementation.

impl DbClient {
    /// Connects to the SurrealDB endpoint from the configuration.
    pub async fn surreal(config: &Config) -> Res<Self> {
        let client = SurrealDbClient::new(&config.db_endpoint).await?;
        Ok(Self { inner: Arc::new(client) })
    }

    /// Creates a fresh in-memory store.
    pub async fn surreal_memory() -> Res<Self> {
        let client = SurrealDbClient::new("mem://").await?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Records.

/// An event row as stored in SurrealDB; the record key equals `seq`.
#[derive(Debug, Serialize, Deserialize)]
struct EventRecord {
    seq: i64,
    start_time: i64,
    description: String,
}

impl TryFrom<EventRecord> for Event {
    type Error = anyhow::Error;

    fn try_from(record: EventRecord) -> Res<Self> {
        let start_time = DateTime::from_timestamp_millis(record.start_time).ok_or_else(|| anyhow!("Event {} has an out of range start time.", record.seq))?;

        Ok(Event {
            id: record.seq,
            start_time,
            description: record.description,
        })
    }
}

/// The id counter; bumped once per created event and never decremented.
#[derive(Debug, Deserialize)]
struct Counter {
    last_id: i64,
}

fn into_events(records: Vec<EventRecord>) -> Res<Vec<Event>> {
    records.into_iter().map(Event::try_from).collect()
}

// Client.

/// SurrealDB event store.
///
/// Creates and deletes go through `write_lock`, so there is a single writer even
/// while the digest scheduler reads concurrently.
pub struct SurrealDbClient {
    db: Surreal<Any>,
    write_lock: Mutex<()>,
}

impl SurrealDbClient {
    /// Opens the store and defines its schema.
    #[instrument(name = "SurrealDbClient::new", skip_all)]
    pub async fn new(endpoint: &str) -> Res<Self> {
        let db = any::connect(endpoint).await.map_err(|e| anyhow!("Cannot open event store at `{}`: {}", endpoint, e))?;

        db.use_ns("herald").use_db("events").await?;

        // Define schemas.

        db.query(
            "DEFINE TABLE IF NOT EXISTS reminder_event SCHEMAFULL;
             DEFINE FIELD IF NOT EXISTS seq ON reminder_event TYPE int;
             DEFINE FIELD IF NOT EXISTS start_time ON reminder_event TYPE int;
             DEFINE FIELD IF NOT EXISTS description ON reminder_event TYPE string;
             DEFINE INDEX IF NOT EXISTS event_start_time ON reminder_event FIELDS start_time;
             DEFINE TABLE IF NOT EXISTS counter SCHEMALESS;",
        )
        .await?
        .check()?;

        info!("Event store at `{}` initialized successfully.", endpoint);

        Ok(Self { db, write_lock: Mutex::new(()) })
    }
}

#[async_trait]
impl GenericDbClient for SurrealDbClient {
    #[instrument(skip(self))]
    async fn create_event(&self, start_time: DateTime<Utc>, description: &str) -> Res<Event> {
        let _guard = self.write_lock.lock().await;

        let mut response = self.db.query("UPSERT counter:events SET last_id += 1 RETURN AFTER").await?.check()?;
        let counter: Option<Counter> = response.take(0)?;
        let seq = counter.ok_or_else(|| anyhow!("Failed to advance the event id counter."))?.last_id;

        let mut response = self
            .db
            .query("CREATE type::thing('reminder_event', $seq) CONTENT { seq: $seq, start_time: $start_time, description: $description }")
            .bind(("seq", seq))
            .bind(("start_time", start_time.timestamp_millis()))
            .bind(("description", description.to_string()))
            .await?
            .check()?;
        let record: Option<EventRecord> = response.take(0)?;

        record.ok_or_else(|| anyhow!("Event {} was not stored.", seq))?.try_into()
    }

    #[instrument(skip(self))]
    async fn find_events_in_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Res<Vec<Event>> {
        let mut response = self
            .db
            .query("SELECT * FROM reminder_event WHERE start_time > $from AND start_time < $to ORDER BY seq ASC")
            .bind(("from", from.timestamp_millis()))
            .bind(("to", to.timestamp_millis()))
            .await?
            .check()?;
        let records: Vec<EventRecord> = response.take(0)?;

        into_events(records)
    }

    #[instrument(skip(self))]
    async fn find_events_after(&self, from: DateTime<Utc>) -> Res<Vec<Event>> {
        let mut response = self
            .db
            .query("SELECT * FROM reminder_event WHERE start_time > $from ORDER BY seq ASC")
            .bind(("from", from.timestamp_millis()))
            .await?
            .check()?;
        let records: Vec<EventRecord> = response.take(0)?;

        into_events(records)
    }

    #[instrument(skip(self))]
    async fn delete_event(&self, id: i64) -> Res<Option<Event>> {
        let _guard = self.write_lock.lock().await;

        let mut response = self.db.query("DELETE type::thing('reminder_event', $id) RETURN BEFORE").bind(("id", id)).await?.check()?;
        let record: Option<EventRecord> = response.take(0)?;

        record.map(Event::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn all_events(&self) -> Res<Vec<Event>> {
        let mut response = self.db.query("SELECT * FROM reminder_event ORDER BY seq ASC").await?.check()?;
        let records: Vec<EventRecord> = response.take(0)?;

        into_events(records)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let db = DbClient::surreal_memory().await.unwrap();
        let now = Utc::now();

        let first = db.create_event(now, "first").await.unwrap();
        let second = db.create_event(now, "second").await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(second.description, "second");
        assert_eq!(db.all_events().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let db = DbClient::surreal_memory().await.unwrap();
        let now = Utc::now();

        let first = db.create_event(now, "first").await.unwrap();
        db.delete_event(first.id).await.unwrap();
        let second = db.create_event(now, "second").await.unwrap();

        assert_eq!(second.id, first.id + 1);
    }

    #[tokio::test]
    async fn test_range_bounds_are_exclusive() {
        let db = DbClient::surreal_memory().await.unwrap();
        let from = DateTime::from_timestamp(1_900_000_000, 0).unwrap();
        let to = from + Duration::hours(24);

        db.create_event(from, "at start").await.unwrap();
        db.create_event(from + Duration::hours(1), "inside").await.unwrap();
        db.create_event(to, "at end").await.unwrap();

        let found = db.find_events_in_range(from, to).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].description, "inside");
        assert_eq!(found[0].start_time, from + Duration::hours(1));
    }

    #[tokio::test]
    async fn test_find_upcoming_skips_past_events() {
        let db = DbClient::surreal_memory().await.unwrap();
        let now = Utc::now();

        db.create_event(now - Duration::seconds(10), "past").await.unwrap();
        db.create_event(now + Duration::seconds(10), "future").await.unwrap();

        let upcoming = db.find_upcoming(now).await.unwrap();

        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].description, "future");
    }

    #[tokio::test]
    async fn test_delete_reports_missing_event() {
        let db = DbClient::surreal_memory().await.unwrap();
        let event = db.create_event(Utc::now(), "party").await.unwrap();

        assert!(db.delete_event(event.id + 41).await.unwrap().is_none());

        let deleted = db.delete_event(event.id).await.unwrap();

        assert_eq!(deleted.map(|e| e.description), Some("party".to_string()));
        assert!(db.all_events().await.unwrap().is_empty());
    }
}
