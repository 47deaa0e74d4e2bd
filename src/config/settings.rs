use serde::Deserialize;

use crate::utils::BrokerError;

/// Lowest fixed port the server may listen on; `0` (ephemeral) is also
/// accepted.
pub const MIN_PORT: u16 = 1024;

/// Whether `port` is `0` or in `MIN_PORT..=65535`.
pub fn is_valid_port(port: u16) -> bool {
    port == 0 || port >= MIN_PORT
}

/// Top-level configuration settings for the server.
///
/// Includes settings for the listener, the broker and logging.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server: ServerSettings,
    pub broker: BrokerSettings,
    pub log: LogSettings,
}

/// Configuration settings for the listener.
///
/// A `port` of `0` asks the kernel for an ephemeral port.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Configuration settings for the broker.
///
/// `max_connections` bounds the number of simultaneously active clients;
/// `0` means unbounded.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    pub max_connections: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub broker: Option<PartialBrokerSettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub max_connections: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            broker: BrokerSettings { max_connections: 0 },
            log: LogSettings {
                level: "warn".to_string(),
            },
        }
    }
}

impl Settings {
    /// Fills in everything `partial` leaves unset from `Settings::default()`.
    pub fn merged(partial: PartialSettings) -> Self {
        let default = Settings::default();

        Settings {
            server: ServerSettings {
                host: partial
                    .server
                    .as_ref()
                    .and_then(|s| s.host.clone())
                    .unwrap_or(default.server.host),
                port: partial
                    .server
                    .as_ref()
                    .and_then(|s| s.port)
                    .unwrap_or(default.server.port),
            },
            broker: BrokerSettings {
                max_connections: partial
                    .broker
                    .as_ref()
                    .and_then(|b| b.max_connections)
                    .unwrap_or(default.broker.max_connections),
            },
            log: LogSettings {
                level: partial
                    .log
                    .as_ref()
                    .and_then(|l| l.level.clone())
                    .unwrap_or(default.log.level),
            },
        }
    }

    /// Applies command-line values, which take precedence over every other
    /// source.
    pub fn with_cli(mut self, max_connections: usize, port: Option<u16>) -> Self {
        self.broker.max_connections = max_connections;
        if let Some(port) = port {
            self.server.port = port;
        }
        self
    }

    /// Checks the merged settings, whichever source each value came from.
    pub fn validate(&self) -> Result<(), BrokerError> {
        if !is_valid_port(self.server.port) {
            return Err(BrokerError::Usage);
        }
        Ok(())
    }
}
