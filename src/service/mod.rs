//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for the services used by herald-bot:
//! - Chat services (e.g., Slack)
//! - Database services (e.g., SurrealDB)
//! - Mail services (e.g., SMTP)
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod chat;
pub mod db;
pub mod mail;
