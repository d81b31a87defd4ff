//! tg-tester - Paced load tester for an outbound messaging API
//!
//! Sends a configured number of messages to a single chat without
//! exceeding a per-second ceiling, honoring the service's 429
//! `retry_after` throttle signals.
//!
//! # Quick Start
//!
//! ```bash
//! # BOT_TOKEN in the environment or a .env file
//! cargo run -p tg-tester -- --config config/config.toml
//! ```
//!
//! The pacing loop itself lives in `core-logic`; this crate contributes
//! the Bot API client, configuration, and the [`MessageBlast`] worker.

pub mod client;
pub mod config;
pub mod sender;

pub use client::{SendOutcome, TelegramClient};
pub use config::TgTesterConfig;
pub use sender::MessageBlast;
