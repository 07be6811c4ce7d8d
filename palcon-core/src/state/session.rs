//! Lifecycle of a single RCON session.
//!
//! Transitions are validated and return `Result` instead of panicking.

use std::time::Instant;

use crate::error::RconError;

// ── SessionState ─────────────────────────────────────────────────

/// The current phase of one RCON session.
///
/// ```text
///  Closed ──► Connecting ──► Authenticating ──► Ready ──► Closed
///                 │                 │             │
///                 └────────────► Faulted ◄────────┘
/// ```
///
/// `Closed` is both the initial and the terminal state. `Faulted` is
/// terminal: a session that saw an I/O error is never reused.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No socket. Initial / terminal state.
    #[default]
    Closed,

    /// TCP link is up; nothing has been exchanged yet.
    Connecting,

    /// AUTH packet sent, waiting for AUTH_RESPONSE.
    Authenticating,

    /// Authenticated; commands may be sent.
    Ready {
        /// When authentication completed.
        since: Instant,
    },

    /// An I/O or protocol failure ended the session.
    Faulted,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Authenticating => write!(f, "Authenticating"),
            Self::Ready { .. } => write!(f, "Ready"),
            Self::Faulted => write!(f, "Faulted"),
        }
    }
}

impl SessionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// Returns `true` once no further traffic is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Faulted)
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Valid from: `Closed`.
    pub fn begin_connect(&mut self) -> Result<(), RconError> {
        match self {
            Self::Closed => {
                *self = Self::Connecting;
                Ok(())
            }
            _ => Err(RconError::InvalidState("cannot connect: session not closed")),
        }
    }

    /// Valid from: `Connecting`.
    pub fn begin_auth(&mut self) -> Result<(), RconError> {
        match self {
            Self::Connecting => {
                *self = Self::Authenticating;
                Ok(())
            }
            _ => Err(RconError::InvalidState(
                "cannot authenticate: session not connecting",
            )),
        }
    }

    /// Valid from: `Authenticating`.
    pub fn complete_auth(&mut self) -> Result<(), RconError> {
        match self {
            Self::Authenticating => {
                *self = Self::Ready {
                    since: Instant::now(),
                };
                Ok(())
            }
            _ => Err(RconError::InvalidState(
                "cannot complete authentication: not authenticating",
            )),
        }
    }

    /// Move to `Faulted` from any live state. No-op once terminal.
    pub fn fault(&mut self) {
        if !self.is_terminal() {
            *self = Self::Faulted;
        }
    }

    /// Move to `Closed` unless already `Faulted`. Idempotent.
    pub fn close(&mut self) {
        if !matches!(self, Self::Faulted) {
            *self = Self::Closed;
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_lifecycle() {
        let mut state = SessionState::default();
        assert_eq!(state, SessionState::Closed);

        state.begin_connect().unwrap();
        assert_eq!(state, SessionState::Connecting);

        state.begin_auth().unwrap();
        assert_eq!(state, SessionState::Authenticating);

        state.complete_auth().unwrap();
        assert!(state.is_ready());

        state.close();
        assert_eq!(state, SessionState::Closed);
        assert!(state.is_terminal());
    }

    #[test]
    fn cannot_skip_authentication() {
        let mut state = SessionState::Connecting;
        assert!(state.complete_auth().is_err());
        assert_eq!(state, SessionState::Connecting);
    }

    #[test]
    fn cannot_authenticate_twice() {
        let mut state = SessionState::Ready {
            since: Instant::now(),
        };
        assert!(state.begin_auth().is_err());
    }

    #[test]
    fn fault_from_authenticating() {
        let mut state = SessionState::Authenticating;
        state.fault();
        assert_eq!(state, SessionState::Faulted);
        assert!(state.begin_connect().is_err());
    }

    #[test]
    fn close_is_idempotent_and_keeps_fault() {
        let mut state = SessionState::Closed;
        state.close();
        state.close();
        assert_eq!(state, SessionState::Closed);

        let mut state = SessionState::Faulted;
        state.close();
        assert_eq!(state, SessionState::Faulted);
    }

    #[test]
    fn fault_on_closed_is_noop() {
        let mut state = SessionState::Closed;
        state.fault();
        assert_eq!(state, SessionState::Closed);
    }

    #[test]
    fn display_format() {
        assert_eq!(SessionState::Closed.to_string(), "Closed");
        assert_eq!(SessionState::Authenticating.to_string(), "Authenticating");
        assert_eq!(
            SessionState::Ready {
                since: Instant::now()
            }
            .to_string(),
            "Ready"
        );
        assert_eq!(SessionState::Faulted.to_string(), "Faulted");
    }
}
