//! Library root for `herald-bot`.
//!
//! Herald-bot is a small chat bot for a community space. It:
//! - Answers liveness checks and lists its commands
//! - Keeps a store of upcoming events that channel members add and remove
//! - Mails a daily digest of the day's events on a schedule
//!
//! The bot integrates with Slack for chat, SurrealDB for storage and SMTP for
//! mail. Each of those sits behind a trait so tests can swap in mocks.

pub mod base;
pub mod bots;
pub mod dispatch;
pub mod prelude;
pub mod reminder;
pub mod runtime;
pub mod service;

use anyhow::anyhow;
use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Installs the crypto provider, builds the runtime and runs it until the chat
/// listener exits.
pub async fn start(config: Config) -> Void {
    info!("Starting herald-bot ...");

    // Start the crypto provider.
    crypto::ring::default_provider().install_default().map_err(|_| anyhow!("Failed to install the rustls crypto provider."))?;

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
