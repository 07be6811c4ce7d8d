//! PalCon console entry point.
//!
//! ```text
//! palcon                              Prompt for host, port and password
//! palcon --host 10.0.0.5 --port 25575 Prompt for the password only
//! palcon --config <path>              Use custom config TOML
//! palcon --gen-config                 Dump default config and exit
//! ```

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use palcon_console::app::{Action, ConsoleApp, error_line, timestamped};
use palcon_console::config::ConsoleConfig;
use palcon_core::{Credentials, DispatchPool, Dispatcher, PlayerPoller};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "palcon", about = "Game server RCON console")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "palcon.toml")]
    config: PathBuf,

    /// Server IPv4 address. Prompted for when absent.
    #[arg(long)]
    host: Option<String>,

    /// Server RCON port. Prompted for when absent.
    #[arg(short, long)]
    port: Option<String>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        println!("{}", ConsoleConfig::default_toml()?);
        return Ok(());
    }

    let config = ConsoleConfig::load(&cli.config);

    // Logs go to stderr so they do not interleave with console output.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("palcon v{}", env!("CARGO_PKG_VERSION"));

    let dispatcher = Arc::new(
        Dispatcher::new(config.commands.clone(), config.network.session_options())
            .max_concurrent_sessions(config.network.max_concurrent_sessions),
    );
    let mut input = spawn_input_reader();

    // ── 1. Login ────────────────────────────────────────────────

    let Some(credentials) = login(&dispatcher, &cli, &config, &mut input).await else {
        return Ok(());
    };

    // ── 2. Console view ─────────────────────────────────────────

    let mut app = ConsoleApp::new(credentials.clone(), dispatcher.table().clone());
    let mut pool = DispatchPool::new(Arc::clone(&dispatcher));
    let (roster_tx, mut roster_rx) = mpsc::unbounded_channel();

    let poller = config.poller.enabled.then(|| {
        PlayerPoller::spawn(
            Arc::clone(&dispatcher),
            credentials.clone(),
            config.poller.poller_options(),
            roster_tx.clone(),
        )
    });

    println!("Type Help for a list of commands.");

    // ── 3. Event loop ───────────────────────────────────────────

    loop {
        tokio::select! {
            line = input.recv() => {
                let Some(line) = line else { break };
                match app.handle_line(&line) {
                    Action::None => {}
                    Action::Print(text) => println!("{text}"),
                    Action::Submit(request) => {
                        pool.submit(app.credentials().clone(), request);
                    }
                    Action::Quit => break,
                }
            }
            Some(event) = pool.recv() => {
                println!("{}", app.on_dispatch(event));
            }
            Some(players) = roster_rx.recv() => {
                for line in app.on_roster(players) {
                    println!("{line}");
                }
            }
        }
    }

    // ── 4. Shutdown ─────────────────────────────────────────────

    info!("shutting down");
    if let Some(poller) = poller {
        poller.stop().await;
    }
    if pool.in_flight() > 0 {
        warn!("abandoning {} in-flight commands", pool.in_flight());
    }
    pool.abort_all();
    app.close();
    drop(roster_tx);

    Ok(())
}

// ── Input ────────────────────────────────────────────────────────

/// Read stdin lines on a dedicated thread and forward them.
///
/// Not `spawn_blocking`: runtime shutdown would wait on a parked `read_line`.
fn spawn_input_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn prompt(label: &str, input: &mut mpsc::UnboundedReceiver<String>) -> Option<String> {
    print!("{label}");
    let _ = std::io::stdout().flush();
    input.recv().await
}

/// Ask for credentials until the server accepts them. `None` on EOF.
async fn login(
    dispatcher: &Dispatcher,
    cli: &Cli,
    config: &ConsoleConfig,
    input: &mut mpsc::UnboundedReceiver<String>,
) -> Option<Credentials> {
    let mut host = cli.host.clone();
    let mut port = cli.port.clone();

    loop {
        let host_text = match host.take() {
            Some(h) => h,
            None => prompt("IP Address: ", input).await?,
        };
        let port_text = match port.take() {
            Some(p) => p,
            None => {
                let default = config.network.default_port;
                let entered = prompt(&format!("Port [{default}]: "), input).await?;
                if entered.trim().is_empty() { default.to_string() } else { entered }
            }
        };
        let password = prompt("Password: ", input).await?;

        let credentials = Credentials::new(host_text, port_text, password);
        match dispatcher.login(&credentials).await {
            Ok(output) => {
                println!("{}", timestamped(&format!("Connected. {}", output.response.trim_end())));
                return Some(credentials);
            }
            Err(e) => {
                warn!("login failed: {e}");
                println!("{}", error_line(&e));
            }
        }
    }
}
