//! Errors reported by the server through the message stream.

use serde::Serialize;

/// A connection problem announced by the server (general handler).
///
/// Every variant ends the connection: the client loop stops and returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "problem", rename_all = "snake_case")]
pub enum ConnectionProblem {
    #[error("Authentication failed.")]
    AuthenticationFailed,

    #[error("No servers available.")]
    NoServersAvailable,

    /// Code 2. The text depends on whether the player was already in game.
    #[error("{}", already_logged_in_text(.in_game))]
    AlreadyLoggedIn { in_game: bool },

    #[error("Speed hack detected.")]
    SpeedHack,

    #[error("Duplicated login.")]
    DuplicatedLogin,

    #[error("Unknown connection error.")]
    Unknown { code: u8 },
}

fn already_logged_in_text(in_game: &bool) -> &'static str {
    if *in_game {
        "Someone else is trying to use this account."
    } else {
        "This account is already logged in."
    }
}

impl ConnectionProblem {
    /// Maps the server's problem code.
    pub fn from_code(code: u8, in_game: bool) -> Self {
        match code {
            0 => Self::AuthenticationFailed,
            1 => Self::NoServersAvailable,
            2 => Self::AlreadyLoggedIn { in_game },
            3 => Self::SpeedHack,
            8 => Self::DuplicatedLogin,
            code => Self::Unknown { code },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_known_codes() {
        assert_eq!(ConnectionProblem::from_code(0, true), ConnectionProblem::AuthenticationFailed);
        assert_eq!(ConnectionProblem::from_code(1, true), ConnectionProblem::NoServersAvailable);
        assert_eq!(ConnectionProblem::from_code(3, true), ConnectionProblem::SpeedHack);
        assert_eq!(ConnectionProblem::from_code(8, true), ConnectionProblem::DuplicatedLogin);
        assert_eq!(
            ConnectionProblem::from_code(42, true),
            ConnectionProblem::Unknown { code: 42 }
        );
    }

    #[test]
    fn test_already_logged_in_text_depends_on_state() {
        assert_eq!(
            ConnectionProblem::from_code(2, true).to_string(),
            "Someone else is trying to use this account."
        );
        assert_eq!(
            ConnectionProblem::from_code(2, false).to_string(),
            "This account is already logged in."
        );
    }
}
