//! Configuration loader for stream-relay

use crate::supervisor::CommandSpec;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::time::Duration;

fn default_program() -> String {
    "ffmpeg".to_string()
}

fn default_codec() -> String {
    "copy".to_string()
}

fn default_output_format() -> String {
    "flv".to_string()
}

fn default_cooldown_secs() -> u64 {
    10
}

/// Configuration for the restream supervisor
#[derive(Debug, Clone, Deserialize)]
pub struct StreamRelayConfig {
    /// Source stream URL (e.g. an HLS playlist)
    pub input_url: String,
    /// Destination URL (e.g. an RTMPS ingest endpoint)
    pub output_url: String,
    /// Restreaming binary to invoke
    #[serde(default = "default_program")]
    pub program: String,
    /// Video codec argument (`copy` relays without re-encoding)
    #[serde(default = "default_codec")]
    pub video_codec: String,
    /// Audio codec argument
    #[serde(default = "default_codec")]
    pub audio_codec: String,
    /// Output container format
    #[serde(default = "default_output_format")]
    pub output_format: String,
    /// Seconds to wait between relaunches
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Extra arguments inserted before the output URL
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl StreamRelayConfig {
    /// Load configuration from a TOML file
    pub fn from_path(path: &str) -> Result<Self> {
        let content =
            fs::read_to_string(path).context(format!("Failed to read config from {}", path))?;
        toml::from_str(&content).context("Failed to parse config TOML")
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    /// Fixed argv for every (re)launch.
    pub fn command(&self) -> CommandSpec {
        let mut args = vec![
            "-re".to_string(),
            "-i".to_string(),
            self.input_url.clone(),
            "-c:v".to_string(),
            self.video_codec.clone(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args.push("-f".to_string());
        args.push(self.output_format.clone());
        args.push(self.output_url.clone());

        CommandSpec {
            program: self.program.clone(),
            args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builds_the_relay_argv() {
        let config = StreamRelayConfig {
            input_url: "https://example.org/live/chunks.m3u8".to_string(),
            output_url: "rtmps://ingest.example.org/s/key".to_string(),
            program: default_program(),
            video_codec: default_codec(),
            audio_codec: default_codec(),
            output_format: default_output_format(),
            cooldown_secs: default_cooldown_secs(),
            extra_args: vec![],
        };

        let spec = config.command();
        assert_eq!(spec.program, "ffmpeg");
        assert_eq!(
            spec.args,
            vec![
                "-re",
                "-i",
                "https://example.org/live/chunks.m3u8",
                "-c:v",
                "copy",
                "-c:a",
                "copy",
                "-f",
                "flv",
                "rtmps://ingest.example.org/s/key",
            ]
        );
    }

    #[test]
    fn parses_toml_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "input_url = \"https://example.org/a.m3u8\"\noutput_url = \"rtmps://x/y\""
        )
        .unwrap();

        let config = StreamRelayConfig::from_path(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.program, "ffmpeg");
        assert_eq!(config.cooldown_secs, 10);
        assert_eq!(config.cooldown(), Duration::from_secs(10));
    }
}
