//! Command Sanitizer: user-facing command text → wire-ready arguments.
//!
//! The set of known commands is an open, configurable [`CommandTable`].
//! A handful of names get special argument rules; every other known name
//! passes its argument through untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::RconError;
use crate::latin1;
use crate::packet::MAX_BODY_SIZE;

/// Width of the in-game chat box, in characters.
pub const BROADCAST_LINE_WIDTH: usize = 39;

/// Substituted for spaces so the server keeps a message as one argument
/// and the chat renderer does not collapse it.
pub const NBSP: char = '\u{00A0}';

// ── CommandTable ─────────────────────────────────────────────────

/// Known commands: canonical wire name → help text.
///
/// Lookups are case-insensitive; the stored spelling is what goes on the
/// wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandTable {
    entries: BTreeMap<String, String>,
}

impl Default for CommandTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for (name, help) in [
            ("Broadcast", "{MessageText} Send message to all players in the server."),
            ("Info", "Returns server info."),
            (
                "Shutdown",
                "{Seconds} {MessageText} Shut down the server after {Seconds} and display {MessageText}.",
            ),
            ("DoExit", "Force stop the server with no warning text."),
            ("KickPlayer", "{SteamID} Kick player from the server."),
            ("BanPlayer", "{SteamID} BAN player from the server."),
            ("TeleportToPlayer", "{SteamID} Teleport to current location of target player."),
            ("TeleportToMe", "{SteamID} Target player teleports to your current location."),
            ("ShowPlayers", "Show information on all connected players."),
            ("Save", "Save the world data."),
        ] {
            table.insert(name, help);
        }
        table
    }
}

impl CommandTable {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, help: impl Into<String>) {
        self.entries.insert(name.into(), help.into());
    }

    /// The canonical spelling of `name`, if it is known.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entries
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// `(name, help)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── CommandRequest ───────────────────────────────────────────────

/// A command as typed by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub name: String,
    pub raw_argument: String,
}

impl CommandRequest {
    pub fn new(name: impl Into<String>, raw_argument: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_argument: raw_argument.into(),
        }
    }

    /// Split an input line at the first space. `None` for a blank line.
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim_start();
        if entry.trim().is_empty() {
            return None;
        }
        let (name, argument) = entry.split_once(' ').unwrap_or((entry, ""));
        Some(Self::new(name.trim_end(), argument.trim_end()))
    }
}

// ── SanitizedCommand ─────────────────────────────────────────────

/// One positional argument on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireArg {
    Text(String),
    Int(i64),
}

impl fmt::Display for WireArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
        }
    }
}

/// A validated command ready to be framed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedCommand {
    pub wire_name: String,
    pub args: Vec<WireArg>,
}

impl SanitizedCommand {
    pub fn new(wire_name: impl Into<String>, args: Vec<WireArg>) -> Self {
        Self {
            wire_name: wire_name.into(),
            args,
        }
    }

    /// The command line sent in the packet body: name and arguments
    /// separated by single spaces.
    pub fn wire_text(&self) -> String {
        let mut line = self.wire_name.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string());
        }
        line
    }
}

impl fmt::Display for SanitizedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wire_text())
    }
}

// ── sanitize ─────────────────────────────────────────────────────

/// Map a command name and free-text argument to its wire form.
pub fn sanitize(
    table: &CommandTable,
    name: &str,
    raw_argument: &str,
) -> Result<SanitizedCommand, RconError> {
    let wire_name = table
        .lookup(name)
        .ok_or_else(|| RconError::UnknownCommand(name.to_string()))?;

    let command = match wire_name.to_ascii_lowercase().as_str() {
        "broadcast" => {
            require_argument(wire_name, raw_argument)?;
            SanitizedCommand::new(
                wire_name,
                vec![WireArg::Text(broadcast_text(raw_argument))],
            )
        }
        "info" | "showplayers" => SanitizedCommand::new(wire_name, Vec::new()),
        "kickplayer" | "banplayer" | "teleporttoplayer" | "teleporttome" => {
            let id = require_argument(wire_name, raw_argument)?;
            SanitizedCommand::new(wire_name, vec![WireArg::Text(id.to_string())])
        }
        "shutdown" => shutdown(table, wire_name, raw_argument),
        _ if raw_argument.is_empty() => SanitizedCommand::new(wire_name, Vec::new()),
        _ => SanitizedCommand::new(wire_name, vec![WireArg::Text(raw_argument.to_string())]),
    };

    check_sendable(&command)?;
    Ok(command)
}

/// Refuse what the packet encoder would refuse, so no session is opened
/// for a command that cannot be sent.
fn check_sendable(command: &SanitizedCommand) -> Result<(), RconError> {
    let size = latin1::encode(&command.wire_text())?.len();
    if size > MAX_BODY_SIZE {
        return Err(RconError::PayloadTooLarge {
            size,
            max: MAX_BODY_SIZE,
        });
    }
    Ok(())
}

fn require_argument<'a>(command: &str, raw: &'a str) -> Result<&'a str, RconError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RconError::MissingArgument {
            command: command.to_string(),
        });
    }
    Ok(trimmed)
}

/// `"<seconds> <message>"`. A non-numeric seconds token falls back to `Info`.
fn shutdown(table: &CommandTable, wire_name: &str, raw: &str) -> SanitizedCommand {
    let raw = raw.trim();
    let (seconds, message) = raw
        .split_once(char::is_whitespace)
        .unwrap_or((raw, ""));

    let Ok(seconds) = seconds.parse::<i64>() else {
        warn!("shutdown delay {seconds:?} is not an integer; sending Info instead");
        return SanitizedCommand::new(table.lookup("info").unwrap_or("Info"), Vec::new());
    };

    let mut args = vec![WireArg::Int(seconds)];
    let message = message.trim();
    if !message.is_empty() {
        args.push(WireArg::Text(message.replace(' ', &NBSP.to_string())));
    }
    SanitizedCommand::new(wire_name, args)
}

/// Spaces become NBSP; messages wider than the chat box are wrapped.
fn broadcast_text(raw: &str) -> String {
    let message = raw.replace(' ', &NBSP.to_string());
    if message.chars().count() > BROADCAST_LINE_WIDTH {
        wrap_message(raw, BROADCAST_LINE_WIDTH)
    } else {
        message
    }
}

/// Greedy word packing into lines of at most `max_width` characters.
///
/// Words are split on single spaces, so a run of spaces yields empty
/// words and every space in `message` becomes either NBSP (inside a line)
/// or `\n` (between lines). No other character changes. A word joins the
/// current line when `line + word + 1 <= max_width`, where `line` counts
/// one trailing separator per word already placed. A single word wider
/// than `max_width` gets a line to itself.
pub fn wrap_message(message: &str, max_width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    let mut line_width = 0;
    let mut placed = 0;

    for word in message.split(' ') {
        let word_width = word.chars().count();
        if placed > 0 && line_width + word_width + 1 > max_width {
            lines.push(std::mem::take(&mut line));
            line_width = 0;
            placed = 0;
        }
        if placed > 0 {
            line.push(NBSP);
        }
        line.push_str(word);
        line_width += word_width + 1;
        placed += 1;
    }
    lines.push(line);
    lines.join("\n")
}

// ── Tests ────────────────────────────────────────────────────────
