//! Error types for the session layer.

use crate::SessionState;

/// Errors that can occur while managing the session or the relation table.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A relation was set for an empty nickname.
    #[error("nickname must not be empty")]
    EmptyNick,

    /// The nickname does not fit the 24-byte wire field.
    #[error("nickname `{0}` is longer than 24 bytes")]
    NickTooLong(String),

    /// The requested lifecycle transition is not allowed.
    #[error("invalid session transition from {from:?} to {to:?}")]
    InvalidTransition { from: SessionState, to: SessionState },
}
