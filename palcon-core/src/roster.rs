//! The currently displayed players.
//!
//! Owned by the UI loop: created when the console view opens, cleared
//! when it closes, and updated only from marshaled poll results. It is
//! never shared across threads, so it needs no locking.

use std::collections::HashSet;

use crate::players::PlayerRecord;

/// Players that appeared or disappeared between two polls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterDiff {
    pub joined: Vec<PlayerRecord>,
    pub left: Vec<PlayerRecord>,
}

impl RosterDiff {
    pub fn is_empty(&self) -> bool {
        self.joined.is_empty() && self.left.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Roster {
    players: Vec<PlayerRecord>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Players in server listing order.
    pub fn players(&self) -> &[PlayerRecord] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Replace the roster with `latest` and report the difference.
    ///
    /// Records compare by all fields, so a renamed player shows up as one
    /// leave plus one join.
    pub fn apply(&mut self, latest: Vec<PlayerRecord>) -> RosterDiff {
        let before: HashSet<&PlayerRecord> = self.players.iter().collect();
        let after: HashSet<&PlayerRecord> = latest.iter().collect();

        let diff = RosterDiff {
            joined: latest
                .iter()
                .filter(|p| !before.contains(p))
                .cloned()
                .collect(),
            left: self
                .players
                .iter()
                .filter(|p| !after.contains(p))
                .cloned()
                .collect(),
        };

        self.players = latest;
        diff
    }

    /// Case-insensitive lookup by player name.
    pub fn find_by_name(&self, name: &str) -> Option<&PlayerRecord> {
        self.players
            .iter()
            .find(|p| p.player_name.eq_ignore_ascii_case(name))
    }

    pub fn clear(&mut self) {
        self.players.clear();
    }
}
