//! # palcon-console: terminal console for PalCon
//!
//! Logs in to a game server over RCON, then reads commands from the
//! terminal, runs them off the input loop through `palcon-core`, and
//! prints results. A background poller keeps the player roster current
//! and announces joins and leaves.

pub mod app;
pub mod config;
