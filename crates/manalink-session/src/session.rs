//! Session types: the context shared by everything on one connection.
//!
//! A "session" is the client's record of one server connection. It tracks:
//! - WHICH server family we talk to (selects the length table)
//! - WHO the local player is (chat lines are prefixed with this name)
//! - WHAT optional server features are available
//! - WHERE the connection is in its lifecycle

use std::sync::RwLock;

use manalink_protocol::ServerType;
use serde::Deserialize;

use crate::{Permissions, SessionError};

/// Width of nickname fields on the wire.
pub const NICK_LEN: usize = 24;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for one connection.
///
/// Sensible defaults are provided; override the fields you care about and
/// let [`validated`](Self::validated) fix anything out of range.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Server family. Fixed for the connection's lifetime.
    pub server_type: ServerType,

    /// Name of the local player character.
    pub local_nick: String,

    /// The server understands the native channel join/part requests.
    /// Without it, joining a channel falls back to a marker whisper.
    pub join_channel_supported: bool,

    /// Announce MVP effects in the local chat tab.
    pub show_mvp: bool,

    /// Permissions granted to players without an explicit relation.
    pub default_permissions: Permissions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_type: ServerType::default(),
            local_nick: String::new(),
            join_channel_supported: false,
            show_mvp: true,
            default_permissions: Permissions::DEFAULT,
        }
    }
}

impl SessionConfig {
    /// Creates a config for a server family and character.
    pub fn new(server_type: ServerType, local_nick: impl Into<String>) -> Self {
        Self {
            server_type,
            local_nick: local_nick.into(),
            ..Default::default()
        }
    }

    /// Clamps any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`Session::new`]. Rules:
    /// - `local_nick` is cut to [`NICK_LEN`] bytes (on a char boundary),
    ///   the width of every nickname field on the wire.
    pub fn validated(mut self) -> Self {
        if self.local_nick.len() > NICK_LEN {
            let mut end = NICK_LEN;
            while !self.local_nick.is_char_boundary(end) {
                end -= 1;
            }
            tracing::warn!(
                nick = %self.local_nick,
                max = NICK_LEN,
                "local nick exceeds wire field, truncating"
            );
            self.local_nick.truncate(end);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Lifecycle of the connection.
///
/// ```text
///   Connecting ──→ Online ──→ Closed
///        │           │          ↑
///        └───────────┴─→ Failed ┘
/// ```
///
/// - **Connecting**: transport is up, nothing dispatched yet.
/// - **Online**: messages are flowing.
/// - **Failed**: the server reported a connection problem or the stream
///   could not be framed. Only `Closed` can follow.
/// - **Closed**: terminal. Nothing is dispatched or sent any more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Online,
    Failed { reason: String },
    Closed,
}

impl SessionState {
    fn can_become(&self, next: &SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Connecting, Online)
                | (Connecting | Online, Failed { .. })
                | (Connecting | Online | Failed { .. }, Closed)
        )
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Connection-lifetime context handed to every handler.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    state: RwLock<SessionState>,
}

impl Session {
    /// Creates a session in the `Connecting` state.
    pub fn new(config: SessionConfig) -> Self {
        let config = config.validated();
        tracing::debug!(
            server = %config.server_type,
            nick = %config.local_nick,
            "session created"
        );
        Self {
            config,
            state: RwLock::new(SessionState::Connecting),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn server_type(&self) -> ServerType {
        self.config.server_type
    }

    pub fn local_nick(&self) -> &str {
        &self.config.local_nick
    }

    pub fn join_channel_supported(&self) -> bool {
        self.config.join_channel_supported
    }

    pub fn show_mvp(&self) -> bool {
        self.config.show_mvp
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn is_online(&self) -> bool {
        matches!(self.state(), SessionState::Online)
    }

    /// Moves to `next` if the lifecycle allows it.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidTransition`] otherwise; the state is
    /// left unchanged.
    pub fn transition(&self, next: SessionState) -> Result<(), SessionError> {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if !state.can_become(&next) {
            return Err(SessionError::InvalidTransition {
                from: state.clone(),
                to: next,
            });
        }
        tracing::info!(from = ?*state, to = ?next, "session state changed");
        *state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.server_type, ServerType::EAthena);
        assert!(!config.join_channel_supported);
        assert!(config.show_mvp);
        assert_eq!(config.default_permissions, Permissions::DEFAULT);
    }

    #[test]
    fn test_validated_truncates_long_nick() {
        let config = SessionConfig::new(ServerType::EAthena, "a".repeat(30)).validated();
        assert_eq!(config.local_nick.len(), NICK_LEN);
    }

    #[test]
    fn test_validated_truncates_on_char_boundary() {
        // 23 ASCII bytes + a 2-byte char straddling the limit.
        let nick = format!("{}é", "a".repeat(23));
        let config = SessionConfig::new(ServerType::EAthena, nick).validated();
        assert_eq!(config.local_nick, "a".repeat(23));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"server_type":"tmwathena","local_nick":"Alice"}"#).unwrap();
        assert_eq!(config.server_type, ServerType::TmwAthena);
        assert_eq!(config.local_nick, "Alice");
        assert!(config.show_mvp);
    }

    #[test]
    fn test_session_starts_connecting() {
        let session = Session::new(SessionConfig::new(ServerType::EAthena, "Alice"));
        assert_eq!(session.state(), SessionState::Connecting);
        assert_eq!(session.local_nick(), "Alice");
        assert!(!session.is_online());
    }

    #[test]
    fn test_transition_happy_path() {
        let session = Session::new(SessionConfig::default());
        session.transition(SessionState::Online).unwrap();
        assert!(session.is_online());
        session.transition(SessionState::Closed).unwrap();
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn test_transition_failed_then_closed() {
        let session = Session::new(SessionConfig::default());
        session.transition(SessionState::Online).unwrap();
        session
            .transition(SessionState::Failed {
                reason: "speed hack".into(),
            })
            .unwrap();
        assert!(session.transition(SessionState::Online).is_err());
        session.transition(SessionState::Closed).unwrap();
    }

    #[test]
    fn test_transition_out_of_closed_is_rejected() {
        let session = Session::new(SessionConfig::default());
        session.transition(SessionState::Closed).unwrap();
        let err = session.transition(SessionState::Online).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                from: SessionState::Closed,
                to: SessionState::Online
            }
        ));
        assert_eq!(session.state(), SessionState::Closed);
    }
}
