//! Client and worker configuration.

use std::time::Duration;

use manalink_session::SessionConfig;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Configuration for one [`Client`](crate::Client) connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server family, local player and server features.
    pub session: SessionConfig,

    /// End the connection on an unknown opcode or a bad length field.
    /// When off, the buffered bytes are dropped and reading continues,
    /// which usually garbles the next few messages.
    pub strict_framing: bool,

    /// How long [`ClientBuilder::connect`](crate::ClientBuilder::connect)
    /// waits for the TCP handshake.
    pub connect_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            strict_framing: true,
            connect_timeout_secs: 10,
        }
    }
}

impl ClientConfig {
    /// Upper bound for `connect_timeout_secs`.
    pub const MAX_CONNECT_TIMEOUT_SECS: u64 = 300;

    /// Creates a config around an existing session config.
    pub fn new(session: SessionConfig) -> Self {
        Self {
            session,
            ..Default::default()
        }
    }

    /// Clamps any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`ClientBuilder`](crate::ClientBuilder). Rules:
    /// - `connect_timeout_secs` is kept within `1..=300`.
    /// - the session config is validated too.
    pub fn validated(mut self) -> Self {
        let clamped = self
            .connect_timeout_secs
            .clamp(1, Self::MAX_CONNECT_TIMEOUT_SECS);
        if clamped != self.connect_timeout_secs {
            tracing::warn!(
                value = self.connect_timeout_secs,
                clamped,
                "connect_timeout_secs out of range, clamping"
            );
            self.connect_timeout_secs = clamped;
        }
        self.session = self.session.validated();
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// OnlineListConfig
// ---------------------------------------------------------------------------

/// Timing of the [`OnlineListWorker`](crate::OnlineListWorker).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OnlineListConfig {
    /// Seconds between two automatic fetches.
    pub refresh_secs: u64,

    /// Seconds a single fetch may take before it counts as failed.
    pub fetch_timeout_secs: u64,
}

impl Default for OnlineListConfig {
    fn default() -> Self {
        Self {
            refresh_secs: 60,
            fetch_timeout_secs: 15,
        }
    }
}

impl OnlineListConfig {
    /// Servers regenerate their list at most this often.
    pub const MIN_REFRESH_SECS: u64 = 5;

    /// Clamps out-of-range values.
    ///
    /// - `refresh_secs` is at least [`Self::MIN_REFRESH_SECS`].
    /// - `fetch_timeout_secs` is at least 1 and never above `refresh_secs`.
    pub fn validated(mut self) -> Self {
        if self.refresh_secs < Self::MIN_REFRESH_SECS {
            tracing::warn!(
                value = self.refresh_secs,
                min = Self::MIN_REFRESH_SECS,
                "refresh_secs below minimum, clamping"
            );
            self.refresh_secs = Self::MIN_REFRESH_SECS;
        }
        let clamped = self.fetch_timeout_secs.clamp(1, self.refresh_secs);
        if clamped != self.fetch_timeout_secs {
            tracing::warn!(
                value = self.fetch_timeout_secs,
                clamped,
                "fetch_timeout_secs out of range, clamping"
            );
            self.fetch_timeout_secs = clamped;
        }
        self
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manalink_protocol::ServerType;

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::default();
        assert!(config.strict_framing);
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.session.server_type, ServerType::EAthena);
    }

    #[test]
    fn test_client_config_validated_clamps_timeout() {
        let config = ClientConfig {
            connect_timeout_secs: 0,
            ..Default::default()
        }
        .validated();
        assert_eq!(config.connect_timeout_secs, 1);

        let config = ClientConfig {
            connect_timeout_secs: 10_000,
            ..Default::default()
        }
        .validated();
        assert_eq!(config.connect_timeout_secs, ClientConfig::MAX_CONNECT_TIMEOUT_SECS);
    }

    #[test]
    fn test_client_config_validated_truncates_session_nick() {
        let mut config = ClientConfig::default();
        config.session.local_nick = "n".repeat(40);
        assert_eq!(config.validated().session.local_nick.len(), 24);
    }

    #[test]
    fn test_client_config_deserializes_nested_session() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"session":{"server_type":"tmwathena","local_nick":"Alice"},"strict_framing":false}"#,
        )
        .unwrap();
        assert_eq!(config.session.server_type, ServerType::TmwAthena);
        assert_eq!(config.session.local_nick, "Alice");
        assert!(!config.strict_framing);
        assert_eq!(config.connect_timeout_secs, 10);
    }

    #[test]
    fn test_online_config_validated_clamps() {
        let config = OnlineListConfig {
            refresh_secs: 1,
            fetch_timeout_secs: 30,
        }
        .validated();
        assert_eq!(config.refresh_secs, OnlineListConfig::MIN_REFRESH_SECS);
        assert_eq!(config.fetch_timeout_secs, OnlineListConfig::MIN_REFRESH_SECS);

        let config = OnlineListConfig {
            refresh_secs: 60,
            fetch_timeout_secs: 0,
        }
        .validated();
        assert_eq!(config.fetch_timeout_secs, 1);
    }
}
