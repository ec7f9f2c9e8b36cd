//! Relay server configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use sequence_core::{MatchOptions, Seat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Settings for the relay server and the matches it creates.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// Cards dealt to each player.
    #[serde(default = "default_hand_size")]
    hand_size: usize,

    /// Sequences needed to win, unless the host picks another value.
    #[serde(default = "default_sequences_to_win")]
    sequences_to_win: u32,

    /// Length of generated room codes.
    #[serde(default = "default_room_code_length")]
    room_code_length: usize,

    /// Rooms without traffic for this many seconds are pruned.
    #[serde(default = "default_idle_timeout_secs")]
    idle_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_hand_size() -> usize {
    sequence_core::DEFAULT_HAND_SIZE
}

fn default_sequences_to_win() -> u32 {
    sequence_core::DEFAULT_SEQUENCES_TO_WIN
}

fn default_room_code_length() -> usize {
    6
}

fn default_idle_timeout_secs() -> u64 {
    3600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            hand_size: default_hand_size(),
            sequences_to_win: default_sequences_to_win(),
            room_code_length: default_room_code_length(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Loads the file if one is given, otherwise the defaults, then applies
    /// the `PORT` environment variable.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                debug!("No config file, using defaults");
                Self::default()
            }
        };
        config.with_port_var(std::env::var("PORT").ok())
    }

    /// Overrides the port with the value of a `PORT` variable, if set.
    #[instrument(skip(self))]
    pub fn with_port_var(mut self, value: Option<String>) -> Result<Self, ConfigError> {
        if let Some(raw) = value {
            let port = raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::new(format!("Invalid PORT value {:?}: {}", raw, e)))?;
            debug!(port, "Port taken from environment");
            self.port = port;
        }
        Ok(self)
    }

    /// Applies command-line overrides.
    #[instrument(skip(self))]
    pub fn with_overrides(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// Rejects values no match could be played with.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hand_size == 0 {
            return Err(ConfigError::new("hand_size must be at least 1".to_string()));
        }
        if self.sequences_to_win == 0 {
            return Err(ConfigError::new(
                "sequences_to_win must be at least 1".to_string(),
            ));
        }
        if self.room_code_length == 0 {
            return Err(ConfigError::new(
                "room_code_length must be at least 1".to_string(),
            ));
        }
        if self.room_code_length < 4 {
            warn!(
                room_code_length = self.room_code_length,
                "Short room codes collide easily"
            );
        }
        Ok(())
    }

    /// Address string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Idle time after which a room is pruned.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Match options for a new room; the host may override the threshold
    /// and the opening seat.
    pub fn match_options(
        &self,
        sequences_to_win: Option<u32>,
        first_player: Option<Seat>,
    ) -> MatchOptions {
        MatchOptions {
            hand_size: self.hand_size,
            sequences_to_win: sequences_to_win
                .filter(|n| *n > 0)
                .unwrap_or(self.sequences_to_win),
            first_player: first_player.unwrap_or(Seat::Host),
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(*config.hand_size(), 7);
        assert_eq!(*config.sequences_to_win(), 2);
        assert_eq!(*config.room_code_length(), 6);
        assert_eq!(config.idle_timeout(), Duration::from_secs(3600));
    }

    #[test]
    fn test_port_var_overrides() {
        let config = ServerConfig::default()
            .with_port_var(Some("8080".to_string()))
            .unwrap();
        assert_eq!(*config.port(), 8080);
        assert!(
            ServerConfig::default()
                .with_port_var(Some("eighty".to_string()))
                .is_err()
        );
    }

    #[test]
    fn test_cli_overrides_win() {
        let config = ServerConfig::default()
            .with_port_var(Some("8080".to_string()))
            .unwrap()
            .with_overrides(Some("127.0.0.1".to_string()), Some(9000));
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn test_match_options_from_host_choice() {
        let config = ServerConfig::default();
        let options = config.match_options(Some(1), Some(Seat::Guest));
        assert_eq!(options.sequences_to_win, 1);
        assert_eq!(options.first_player, Seat::Guest);
        assert_eq!(options.hand_size, 7);

        let fallback = config.match_options(Some(0), None);
        assert_eq!(fallback.sequences_to_win, 2);
        assert_eq!(fallback.first_player, Seat::Host);
    }

    #[test]
    fn test_error_records_location() {
        let err = ConfigError::new("boom".to_string());
        assert!(err.file.ends_with("config.rs"));
        assert!(err.to_string().starts_with("Config error: boom at "));
    }
}
