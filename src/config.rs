// src/config.rs

//! # Relay Configuration
//!
//! Defaults, optionally overlaid by a YAML file named in `RELAY_CONFIG`, then by
//! individual environment variables. Loaded once in `main` and passed down explicitly.

use std::{env, net::SocketAddr, path::Path, str::FromStr, time::Duration};

use serde::Deserialize;
use tracing::info;

const CONFIG_PATH_VAR: &str = "RELAY_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidEnv { key: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    pub send_timeout_ms: u64,
    /// Capacity of each connection's outbound queue.
    pub outbound_buffer: usize,
    /// Sent to every connection right after it joins its room.
    pub greeting: String,
    /// Whether a client's own messages are relayed back to it.
    pub echo_to_sender: bool,
    pub max_room_key_len: usize,
    pub redis_url: Option<String>,
    pub redis_channel: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3100)),
            send_timeout_ms: 2_000,
            outbound_buffer: 32,
            greeting: "connected".to_string(),
            echo_to_sender: true,
            max_room_key_len: 128,
            redis_url: None,
            redis_channel: "room_relay_push".to_string(),
        }
    }
}

impl RelayConfig {
    /// Loads the process configuration from `RELAY_CONFIG` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading relay config from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Applies environment-style overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, "RELAY_BIND_ADDR")? {
            self.bind_addr = v;
        }
        if let Some(v) = parse_var(&lookup, "RELAY_SEND_TIMEOUT_MS")? {
            self.send_timeout_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "RELAY_OUTBOUND_BUFFER")? {
            self.outbound_buffer = v;
        }
        if let Some(v) = lookup("RELAY_GREETING") {
            self.greeting = v;
        }
        if let Some(v) = parse_var(&lookup, "RELAY_ECHO_TO_SENDER")? {
            self.echo_to_sender = v;
        }
        if let Some(v) = parse_var(&lookup, "RELAY_MAX_ROOM_KEY_LEN")? {
            self.max_room_key_len = v;
        }
        if let Some(v) = lookup("REDIS_URL").filter(|v| !v.is_empty()) {
            self.redis_url = Some(v);
        }
        if let Some(v) = lookup("RELAY_REDIS_CHANNEL") {
            self.redis_channel = v;
        }

        // A zero-capacity mpsc channel panics on creation.
        if self.outbound_buffer == 0 {
            return Err(ConfigError::InvalidEnv {
                key: "outbound_buffer",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { key, value }),
        None => Ok(None),
    }
}
