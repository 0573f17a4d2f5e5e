//! Core components, types, and utilities for the herald-bot.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - Fixed chat replies and command words.
//! - The chat message model, common types and result handling.

pub mod config;
pub mod replies;
pub mod types;
