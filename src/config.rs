//! Server configuration parsed from environment variables.
//!
//! Every key is optional:
//! - `BIND_ADDR`: listen address, default `0.0.0.0`
//! - `PORT`: default 8000
//! - `CANVAS_PATH`: WebSocket route, default `/canvas`
//! - `BROADCAST_INCLUDE_SENDER`: echo mutations back to their sender, default `true`
//! - `CLIENT_QUEUE_CAPACITY`: outbound messages buffered per connection, default 256
//! - `MAX_MESSAGE_BYTES`: largest inbound frame accepted, default 1 MiB

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_CANVAS_PATH: &str = "/canvas";
pub const DEFAULT_CLIENT_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// Route reserved for the health check.
pub const HEALTH_PATH: &str = "/healthz";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
    #[error("CANVAS_PATH must start with '/' and must not be /healthz: {0:?}")]
    CanvasPath(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub canvas_path: String,
    /// When set, a mutation's broadcast also reaches the connection that sent it.
    pub include_sender: bool,
    pub client_queue_capacity: usize,
    pub max_message_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            canvas_path: DEFAULT_CANVAS_PATH.to_owned(),
            include_sender: true,
            client_queue_capacity: DEFAULT_CLIENT_QUEUE_CAPACITY,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

impl Config {
    /// Build config from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for any present-but-invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Absent keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for any present-but-invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_addr = parse_or("BIND_ADDR", lookup("BIND_ADDR"), defaults.bind_addr)?;
        let port = parse_or("PORT", lookup("PORT"), defaults.port)?;
        let include_sender = match lookup("BROADCAST_INCLUDE_SENDER") {
            Some(raw) => parse_bool("BROADCAST_INCLUDE_SENDER", &raw)?,
            None => defaults.include_sender,
        };
        let client_queue_capacity = parse_or(
            "CLIENT_QUEUE_CAPACITY",
            lookup("CLIENT_QUEUE_CAPACITY"),
            defaults.client_queue_capacity,
        )?;
        let client_queue_capacity = non_zero("CLIENT_QUEUE_CAPACITY", client_queue_capacity)?;
        let max_message_bytes = parse_or("MAX_MESSAGE_BYTES", lookup("MAX_MESSAGE_BYTES"), defaults.max_message_bytes)?;
        let max_message_bytes = non_zero("MAX_MESSAGE_BYTES", max_message_bytes)?;

        let canvas_path = lookup("CANVAS_PATH").unwrap_or(defaults.canvas_path);
        if !canvas_path.starts_with('/') || canvas_path == HEALTH_PATH {
            return Err(ConfigError::CanvasPath(canvas_path));
        }

        Ok(Self { bind_addr, port, canvas_path, include_sender, client_queue_capacity, max_message_bytes })
    }

    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value: raw.to_owned() }),
    }
}

fn non_zero(key: &'static str, value: usize) -> Result<usize, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Zero { key });
    }
    Ok(value)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
