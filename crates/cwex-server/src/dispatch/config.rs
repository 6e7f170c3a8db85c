//! Dispatcher and broker configuration.

use std::time::Duration;

use cwex_core::topic::DEFAULT_NAMESPACE;

/// Broker connection settings.
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// Broker hostname.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Optional username/password pair.
    pub credentials: Option<(String, String)>,
    /// Keep-alive interval.
    pub keep_alive: Duration,
    /// Capacity of the client's outgoing request channel.
    pub channel_capacity: usize,
}

impl MqttConfig {
    /// Create a broker config with default keep-alive and capacity.
    pub fn new(host: impl Into<String>, port: u16, client_id: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            client_id: client_id.into(),
            credentials: None,
            keep_alive: Duration::from_secs(30),
            channel_capacity: 16,
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, username: String, password: String) -> Self {
        self.credentials = Some((username, password));
        self
    }
}

/// Settings for [`super::CommandDispatcher`].
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// First topic level, e.g. `@msg`.
    pub namespace: String,
    /// Upper bound on waiting for a (re)connect before giving up.
    pub connect_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}
