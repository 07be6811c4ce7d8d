//! Background player poller.
//!
//! Repeats `ShowPlayers` on a fixed interval and posts each parsed list
//! to the UI loop. A failed poll is logged and retried on the next tick;
//! only cancellation or a dropped receiver ends the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::credentials::Credentials;
use crate::dispatcher::Dispatcher;
use crate::network::Connector;
use crate::players::{PlayerRecord, parse_player_list};
use crate::sanitizer::SanitizedCommand;

/// Shortest gap between polls; smaller intervals are raised to this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerOptions {
    /// Wait before the first poll.
    pub initial_delay: Duration,
    /// Time between polls. Never less than [`MIN_POLL_INTERVAL`].
    pub interval: Duration,
}

impl Default for PollerOptions {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            interval: Duration::from_secs(30),
        }
    }
}

/// Handle to a running poll loop.
#[derive(Debug)]
pub struct PlayerPoller {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl PlayerPoller {
    /// Start polling. Each successful poll sends the full list on `tx`.
    pub fn spawn<C: Connector>(
        dispatcher: Arc<Dispatcher<C>>,
        credentials: Credentials,
        options: PollerOptions,
        tx: mpsc::UnboundedSender<Vec<PlayerRecord>>,
    ) -> Self {
        let token = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            dispatcher,
            credentials,
            options,
            tx,
            token.clone(),
        ));
        Self { token, handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the loop and wait for it to exit.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            warn!("player poller ended abnormally: {e}");
        }
    }
}

async fn poll_loop<C: Connector>(
    dispatcher: Arc<Dispatcher<C>>,
    credentials: Credentials,
    options: PollerOptions,
    tx: mpsc::UnboundedSender<Vec<PlayerRecord>>,
    token: CancellationToken,
) {
    let command = SanitizedCommand::new(
        dispatcher.table().lookup("showplayers").unwrap_or("ShowPlayers"),
        Vec::new(),
    );

    tokio::select! {
        _ = token.cancelled() => return,
        _ = tokio::time::sleep(options.initial_delay) => {}
    }

    let interval = options.interval.max(MIN_POLL_INTERVAL);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("polling players every {interval:?}");

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            _ = token.cancelled() => break,
            result = dispatcher.dispatch_sanitized(&credentials, &command) => result,
        };

        match result {
            // No body means no answer, not an empty server.
            Ok(output) if output.is_empty() => {
                debug!("player poll got no response; keeping current roster");
            }
            Ok(output) => {
                if tx.send(parse_player_list(&output.response)).is_err() {
                    debug!("roster receiver dropped; stopping poller");
                    break;
                }
            }
            Err(e) => {
                warn!("player poll failed: {e}; retrying in {interval:?}");
            }
        }
    }
    debug!("player poller stopped");
}
