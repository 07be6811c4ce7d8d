//! Domain-specific error types for the RCON client.
//!
//! Every failure that can reach the console is one of the variants of
//! [`RconError`]. Raw I/O errors are classified by the session and the
//! dispatcher before they get here, so callers can match on the variant
//! to decide what to tell the operator.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// A credential input field that can be flagged for correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialField {
    Host,
    Port,
    Password,
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Port => write!(f, "port"),
            Self::Password => write!(f, "password"),
        }
    }
}

/// The canonical error type for the RCON client.
#[derive(Debug, Error)]
pub enum RconError {
    // ── Local validation ─────────────────────────────────────────
    /// Host or port failed validation. No I/O was attempted.
    #[error("invalid credentials: {}", join_fields(.fields))]
    InvalidCredentials { fields: Vec<CredentialField> },

    /// The command name is not in the command table.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The command needs an argument and none was given.
    #[error("command {command} requires an argument")]
    MissingArgument { command: String },

    /// A character in the command text has no ISO-8859-1 representation.
    #[error("character {0:?} cannot be encoded as ISO-8859-1")]
    Unencodable(char),

    // ── Connection ───────────────────────────────────────────────
    /// TCP connect did not complete within the deadline.
    #[error("connection to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    /// TCP connect was refused or otherwise failed.
    #[error("could not connect to {addr}: {source}")]
    ConnectRefused {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The server rejected the password (AUTH_RESPONSE id of -1).
    #[error("authentication rejected: wrong password")]
    WrongPassword,

    // ── Session ──────────────────────────────────────────────────
    /// A session-level read or write exceeded its deadline.
    #[error("session timed out after {0:?}")]
    SessionTimeout(Duration),

    /// The connection failed after it was established.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// A session method was called from a state that does not allow it.
    #[error("invalid session state: {0}")]
    InvalidState(&'static str),

    // ── Packet ───────────────────────────────────────────────────
    /// A frame violated the RCON packet layout.
    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    /// The body is larger than a single packet may carry.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    // ── Catch-all ────────────────────────────────────────────────
    /// Anything that does not fit another variant. Carries the cause.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

fn join_fields(fields: &[CredentialField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl RconError {
    /// Credential fields the operator should re-check for this failure.
    pub fn implicated_fields(&self) -> Vec<CredentialField> {
        match self {
            Self::InvalidCredentials { fields } => fields.clone(),
            Self::WrongPassword => vec![CredentialField::Password],
            Self::ConnectTimeout { .. } | Self::ConnectRefused { .. } => {
                vec![CredentialField::Host, CredentialField::Port]
            }
            _ => Vec::new(),
        }
    }

    /// A short, actionable message for the operator.
    pub fn guidance(&self) -> &'static str {
        match self {
            Self::InvalidCredentials { .. } => "Not a valid IP address or port number",
            Self::UnknownCommand(_) => "Command not valid. Type Help for info",
            Self::MissingArgument { .. } => "This command needs an argument. Type Help for info",
            Self::Unencodable(_) => "The message contains characters the server cannot display",
            Self::WrongPassword => "Invalid password",
            Self::ConnectTimeout { .. } | Self::ConnectRefused { .. } => {
                "Could not reach the server. Check the host and port"
            }
            Self::SessionTimeout(_) | Self::Transport(_) | Self::InvalidState(_) => {
                "Connection to the server was lost. Try again"
            }
            Self::MalformedPacket(_) => "The server sent a response that could not be read",
            Self::PayloadTooLarge { .. } => "The command is too long to send",
            Self::Unexpected(_) => "Unexpected error. Please report it",
        }
    }

    /// Returns `true` for errors raised before any network I/O.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials { .. }
                | Self::UnknownCommand(_)
                | Self::MissingArgument { .. }
                | Self::Unencodable(_)
                | Self::PayloadTooLarge { .. }
        )
    }
}

impl From<tokio::task::JoinError> for RconError {
    fn from(e: tokio::task::JoinError) -> Self {
        RconError::Unexpected(format!("dispatch task failed: {e}"))
    }
}
