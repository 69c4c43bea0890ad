//! Unified error type for manalink.

use manalink_handlers::ConnectionProblem;
use manalink_protocol::ProtocolError;
use manalink_session::SessionError;
use manalink_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `manalink` meta-crate you deal with this single error
/// type. The `#[from]` attribute on each variant generates the `From`
/// impls, so `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ManalinkError {
    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (framing, oversized message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (bad nickname, invalid transition).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The server ended the session with a connection problem.
    #[error(transparent)]
    ConnectionProblem(#[from] ConnectionProblem),

    /// Connecting did not finish within the configured timeout.
    #[error("connect to {addr} timed out after {secs}s")]
    ConnectTimeout { addr: String, secs: u64 },

    /// The online-player list could not be fetched.
    #[error("online list unavailable: {0}")]
    OnlineList(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let err: ManalinkError = err.into();
        assert!(matches!(err, ManalinkError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: ManalinkError = ProtocolError::UnknownOpcode { opcode: 0x7fff }.into();
        assert!(matches!(err, ManalinkError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err: ManalinkError = SessionError::EmptyNick.into();
        assert!(matches!(err, ManalinkError::Session(_)));
    }

    #[test]
    fn test_from_connection_problem_keeps_message() {
        let err: ManalinkError = ConnectionProblem::SpeedHack.into();
        assert!(matches!(
            err,
            ManalinkError::ConnectionProblem(ConnectionProblem::SpeedHack)
        ));
        assert_eq!(err.to_string(), ConnectionProblem::SpeedHack.to_string());
    }

    #[test]
    fn test_connect_timeout_display() {
        let err = ManalinkError::ConnectTimeout {
            addr: "127.0.0.1:6901".into(),
            secs: 10,
        };
        assert_eq!(err.to_string(), "connect to 127.0.0.1:6901 timed out after 10s");
    }
}
