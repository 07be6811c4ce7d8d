//! Console view state and event handling.
//!
//! `ConsoleApp` is only ever touched by the main loop. Network work is
//! handed to a `DispatchPool`; its results and the poller's player lists
//! come back as values and are applied here, one at a time.

use chrono::Local;
use palcon_core::{
    CommandRequest, CommandTable, Credentials, DispatchEvent, PlayerRecord, RconError, Roster,
};

/// What the main loop should do with an input line.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    /// Nothing to do (blank line).
    None,
    /// Print text locally.
    Print(String),
    /// Send a command to the server.
    Submit(CommandRequest),
    /// Leave the console.
    Quit,
}

/// Commands that take a player SteamID as their argument.
const PLAYER_COMMANDS: [&str; 4] = ["kickplayer", "banplayer", "teleporttoplayer", "teleporttome"];

pub struct ConsoleApp {
    credentials: Credentials,
    table: CommandTable,
    roster: Roster,
}

impl ConsoleApp {
    /// Open the console view with an empty roster.
    pub fn new(credentials: Credentials, table: CommandTable) -> Self {
        Self {
            credentials,
            table,
            roster: Roster::new(),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Interpret one line typed by the operator.
    pub fn handle_line(&self, line: &str) -> Action {
        let Some(mut request) = CommandRequest::parse(line) else {
            return Action::None;
        };

        match request.name.to_ascii_lowercase().as_str() {
            "help" => return Action::Print(self.help_text()),
            "players" => return Action::Print(self.players_text()),
            "quit" | "exit" => return Action::Quit,
            _ => {}
        }

        if !self.table.contains(&request.name) {
            return Action::Print(error_line(&RconError::UnknownCommand(request.name)));
        }

        if PLAYER_COMMANDS.contains(&request.name.to_ascii_lowercase().as_str()) {
            if let Some(player) = self.roster.find_by_name(request.raw_argument.trim()) {
                request.raw_argument = player.steam_id.clone();
            }
        }
        Action::Submit(request)
    }

    /// Render a finished dispatch.
    pub fn on_dispatch(&self, event: DispatchEvent) -> String {
        match event.result {
            Ok(output) if output.is_empty() => {
                timestamped(&format!("{}: command sent (no response)", output.command))
            }
            Ok(output) => timestamped(output.response.trim_end()),
            Err(e) => error_line(&e),
        }
    }

    /// Apply a poll result and describe who joined or left.
    pub fn on_roster(&mut self, players: Vec<PlayerRecord>) -> Vec<String> {
        let diff = self.roster.apply(players);
        let joined = diff
            .joined
            .iter()
            .map(|p| timestamped(&format!("{} joined", p.player_name)));
        let left = diff
            .left
            .iter()
            .map(|p| timestamped(&format!("{} left", p.player_name)));
        joined.chain(left).collect()
    }

    /// Close the console view.
    pub fn close(&mut self) {
        self.roster.clear();
    }

    fn help_text(&self) -> String {
        let mut text = String::from("Server Commands\n");
        for (name, help) in self.table.iter() {
            text.push_str(&format!("{name}: {help}\n"));
        }
        text.push_str("Players: list players seen by the last poll\n");
        text.push_str("Quit: leave the console");
        text
    }

    fn players_text(&self) -> String {
        if self.roster.is_empty() {
            return "No players online".into();
        }
        self.roster
            .players()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// `[ HH:MM:SS ] - text` in local time.
pub fn timestamped(text: &str) -> String {
    format!("[ {} ] - {text}", Local::now().format("%H:%M:%S"))
}

/// An error as shown to the operator, with the fields to re-check.
pub fn error_line(error: &RconError) -> String {
    let fields = error.implicated_fields();
    if fields.is_empty() {
        format!("[ ERROR ] {} ({error})", error.guidance())
    } else {
        let fields: Vec<String> = fields.iter().map(ToString::to_string).collect();
        format!(
            "[ ERROR ] {} ({error}); check: {}",
            error.guidance(),
            fields.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palcon_core::CommandOutput;

    fn app() -> ConsoleApp {
        ConsoleApp::new(
            Credentials::new("127.0.0.1", "25575", "pw"),
            CommandTable::default(),
        )
    }

    #[test]
    fn help_is_local() {
        let Action::Print(text) = app().handle_line("Help") else {
            panic!("help should print");
        };
        assert!(text.starts_with("Server Commands"));
        assert!(text.contains("ShowPlayers:"));
    }

    #[test]
    fn blank_and_quit() {
        assert_eq!(app().handle_line("   "), Action::None);
        assert_eq!(app().handle_line("exit"), Action::Quit);
    }

    #[test]
    fn known_command_is_submitted() {
        assert_eq!(
            app().handle_line("broadcast hello all"),
            Action::Submit(CommandRequest::new("broadcast", "hello all"))
        );
    }

    #[test]
    fn unknown_command_is_refused_locally() {
        let Action::Print(text) = app().handle_line("fly away") else {
            panic!("unknown command should print");
        };
        assert!(text.contains("Type Help"));
    }

    #[test]
    fn player_name_resolves_to_steam_id() {
        let mut app = app();
        app.on_roster(vec![PlayerRecord::new("Alice", "1", "76561198000000001")]);
        assert_eq!(
            app.handle_line("kickplayer alice"),
            Action::Submit(CommandRequest::new("kickplayer", "76561198000000001"))
        );
        assert_eq!(
            app.handle_line("banplayer 123"),
            Action::Submit(CommandRequest::new("banplayer", "123"))
        );
    }

    #[test]
    fn roster_updates_report_joins_and_leaves() {
        let mut app = app();
        let lines = app.on_roster(vec![PlayerRecord::new("Alice", "1", "100")]);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("Alice joined"));

        let lines = app.on_roster(vec![PlayerRecord::new("Bob", "2", "200")]);
        assert!(lines[0].ends_with("Bob joined"));
        assert!(lines[1].ends_with("Alice left"));

        app.close();
        assert!(app.roster().is_empty());
    }

    #[test]
    fn dispatch_results_render() {
        let app = app();
        let ok = DispatchEvent {
            ticket: 1,
            request: CommandRequest::new("save", ""),
            result: Ok(CommandOutput {
                command: "Save".into(),
                response: String::new(),
            }),
        };
        assert!(app.on_dispatch(ok).ends_with("Save: command sent (no response)"));

        let err = DispatchEvent {
            ticket: 2,
            request: CommandRequest::new("info", ""),
            result: Err(RconError::WrongPassword),
        };
        let text = app.on_dispatch(err);
        assert!(text.starts_with("[ ERROR ] Invalid password"));
        assert!(text.ends_with("check: password"));
    }

    #[test]
    fn timestamp_format() {
        let line = timestamped("hi");
        assert!(line.starts_with("[ "));
        assert_eq!(&line[10..], " ] - hi");
    }
}
