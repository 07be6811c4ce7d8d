//! Console configuration.
//!
//! Holds timeouts, poller cadence, logging and the command table. Login
//! details are never written here.

use std::path::Path;
use std::time::Duration;

use palcon_core::{CommandTable, PollerOptions, SessionOptions};
use serde::{Deserialize, Serialize};

/// Top-level configuration for the console.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Network settings.
    pub network: NetworkConfig,
    /// Background player polling.
    pub poller: PollerConfig,
    /// Logging.
    pub logging: LoggingConfig,
    /// Known server commands: name → help text.
    pub commands: CommandTable,
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Default server port offered at the login prompt.
    pub default_port: u16,
    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Write / authentication timeout in milliseconds.
    pub io_timeout_ms: u64,
    /// How long to wait for a command response, in milliseconds.
    pub response_timeout_ms: u64,
    /// Maximum sessions open at once.
    pub max_concurrent_sessions: usize,
}

/// Player polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    pub enabled: bool,
    /// Delay before the first poll, in seconds.
    pub initial_delay_secs: u64,
    /// Seconds between polls.
    pub interval_secs: u64,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            default_port: 25575,
            connect_timeout_ms: 5000,
            io_timeout_ms: 5000,
            response_timeout_ms: 3000,
            max_concurrent_sessions: palcon_core::dispatcher::DEFAULT_MAX_CONCURRENT_SESSIONS,
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay_secs: 5,
            interval_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────

impl NetworkConfig {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            io_timeout: Duration::from_millis(self.io_timeout_ms),
            response_timeout: Duration::from_millis(self.response_timeout_ms),
        }
    }
}

impl PollerConfig {
    pub fn poller_options(&self) -> PollerOptions {
        PollerOptions {
            initial_delay: Duration::from_secs(self.initial_delay_secs),
            interval: Duration::from_secs(self.interval_secs.max(1)),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ConsoleConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Default configuration rendered as TOML.
    pub fn default_toml() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&Self::default())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let text = ConsoleConfig::default_toml().unwrap();
        assert!(text.contains("response_timeout_ms"));
        assert!(text.contains("interval_secs"));
        assert!(text.contains("ShowPlayers"));
        assert!(!text.contains("password"));
    }

    #[test]
    fn roundtrip_config() {
        let text = ConsoleConfig::default_toml().unwrap();
        let parsed: ConsoleConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.poller.interval_secs, 30);
        assert_eq!(parsed.poller.initial_delay_secs, 5);
        assert_eq!(parsed.commands, CommandTable::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let parsed: ConsoleConfig = toml::from_str(
            "[network]\nresponse_timeout_ms = 500\n\n[commands]\nInfo = \"info\"\n",
        )
        .unwrap();
        assert_eq!(
            parsed.network.session_options().response_timeout,
            Duration::from_millis(500)
        );
        assert_eq!(parsed.network.connect_timeout_ms, 5000);
        assert_eq!(parsed.commands.len(), 1);
        assert!(parsed.poller.enabled);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let cfg = ConsoleConfig::load(Path::new("/nonexistent/palcon.toml"));
        assert_eq!(cfg.network.default_port, 25575);
    }
}
