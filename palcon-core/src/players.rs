//! Player List Parser for `ShowPlayers` responses.
//!
//! ```text
//! name,playeruid,steamid
//! Alice,1234567890,76561198000000001
//! Bob,987654321,76561198000000002
//! <trailing line>
//! ```

use std::fmt;

use tracing::warn;

/// One connected player.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerRecord {
    pub player_name: String,
    pub player_uid: String,
    pub steam_id: String,
}

impl PlayerRecord {
    pub fn new(
        player_name: impl Into<String>,
        player_uid: impl Into<String>,
        steam_id: impl Into<String>,
    ) -> Self {
        Self {
            player_name: player_name.into(),
            player_uid: player_uid.into(),
            steam_id: steam_id.into(),
        }
    }
}

impl fmt::Display for PlayerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (uid {}, steam {})",
            self.player_name, self.player_uid, self.steam_id
        )
    }
}

/// Parse the table in server order.
///
/// The first line is a header and the last line is always a trailing
/// artifact; both are dropped without inspection. Rows with fewer than
/// three fields are skipped; extra fields are ignored.
pub fn parse_player_list(raw: &str) -> Vec<PlayerRecord> {
    let lines: Vec<&str> = raw.split('\n').collect();
    if lines.len() < 3 {
        return Vec::new();
    }

    lines[1..lines.len() - 1]
        .iter()
        .filter_map(|line| {
            let line = line.trim_end_matches('\r');
            let mut fields = line.split(',');
            match (fields.next(), fields.next(), fields.next()) {
                (Some(name), Some(uid), Some(steam_id)) => {
                    Some(PlayerRecord::new(name, uid, steam_id))
                }
                _ => {
                    warn!("skipping malformed player row {line:?}");
                    None
                }
            }
        })
        .collect()
}
