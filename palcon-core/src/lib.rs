//! # palcon-core
//!
//! RCON client core for the PalCon server console.
//!
//! This crate contains:
//! - **Packet codec**: `Packet`, `PacketType`, pure encode/decode, plus
//!   `RconCodec` for framed I/O via `tokio_util`
//! - **Session**: `Session`, one authenticated connection per exchange,
//!   tolerant of servers that accept a command without replying
//! - **Sanitizer**: `CommandTable` and `sanitize`, turning operator text
//!   into wire arguments
//! - **Dispatcher**: `Dispatcher`, the validate → sanitize → send entry point
//! - **Task**: `DispatchPool`, off-thread dispatch with results marshaled
//!   back over a channel
//! - **Players**: `parse_player_list`, `Roster` diffing and the background
//!   `PlayerPoller`
//! - **Error**: `RconError`, a typed `thiserror`-based taxonomy

pub mod codec;
pub mod credentials;
pub mod dispatcher;
pub mod error;
pub mod latin1;
pub mod network;
pub mod packet;
pub mod players;
pub mod poller;
pub mod roster;
pub mod sanitizer;
pub mod session;
pub mod state;
pub mod task;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use codec::RconCodec;
pub use credentials::{Credentials, ValidCredentials};
pub use dispatcher::{CommandOutput, CommandResult, Dispatcher, join_dispatch};
pub use error::{CredentialField, RconError};
pub use network::{Connector, TcpConnector};
pub use packet::{MAX_BODY_SIZE, MAX_FRAME_SIZE, Packet, PacketType};
pub use players::{PlayerRecord, parse_player_list};
pub use poller::{PlayerPoller, PollerOptions};
pub use roster::{Roster, RosterDiff};
pub use sanitizer::{CommandRequest, CommandTable, SanitizedCommand, WireArg, sanitize};
pub use session::{Session, SessionOptions};
pub use state::SessionState;
pub use task::{DispatchEvent, DispatchPool, Ticket};
