//! Configuration loader for tg-tester

use anyhow::{Context, Result};
use core_logic::PacingConfig;
use serde::Deserialize;
use std::env;
use std::fs;

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_message_text() -> String {
    "Load test".to_string()
}

/// Configuration for the message load tester
#[derive(Debug, Clone, Deserialize)]
pub struct TgTesterConfig {
    /// Destination chat identifier
    pub chat_id: String,
    /// Total number of messages to send
    pub total_messages: u64,
    /// Steady-state ceiling in messages per second
    pub max_per_sec: u32,
    /// Bot API base URL (self-hosted servers can override)
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Text prefix for every message body
    #[serde(default = "default_message_text")]
    pub message_text: String,
}

impl TgTesterConfig {
    /// Load configuration from a TOML file
    pub fn from_path(path: &str) -> Result<Self> {
        let content =
            fs::read_to_string(path).context(format!("Failed to read config from {}", path))?;
        toml::from_str(&content).context("Failed to parse config TOML")
    }

    pub fn pacing(&self) -> PacingConfig {
        PacingConfig::new(self.total_messages, self.max_per_sec)
    }
}

/// The bot token is a secret; it only comes from the environment.
pub fn bot_token_from_env() -> Result<String> {
    env::var("BOT_TOKEN").context("BOT_TOKEN is not set (put it in the environment or .env)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_a_minimal_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "chat_id = \"7892272656\"\ntotal_messages = 100\nmax_per_sec = 30"
        )
        .unwrap();

        let config = TgTesterConfig::from_path(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.chat_id, "7892272656");
        assert_eq!(config.total_messages, 100);
        assert_eq!(config.max_per_sec, 30);
        assert_eq!(config.api_base, "https://api.telegram.org");
        assert!(config.pacing().validate().is_ok());
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chat_id = \"x\"\ntotal_messages = 100").unwrap();

        assert!(TgTesterConfig::from_path(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(TgTesterConfig::from_path("does/not/exist.toml").is_err());
    }
}
