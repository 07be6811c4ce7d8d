//! Off-thread dispatch with results marshaled back to one consumer.
//!
//! The console loop never touches a socket. It submits work to a
//! [`DispatchPool`], which runs each dispatch on the Tokio worker pool
//! and posts an immutable [`DispatchEvent`] back through a channel. The
//! loop that owns display state drains that channel, so every state
//! mutation happens on a single task.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::debug;

use crate::credentials::Credentials;
use crate::dispatcher::{CommandResult, Dispatcher, join_dispatch};
use crate::network::{Connector, TcpConnector};
use crate::sanitizer::CommandRequest;

/// Identifies one submitted dispatch.
pub type Ticket = u64;

/// A finished dispatch, ready to be applied to display state.
#[derive(Debug)]
pub struct DispatchEvent {
    pub ticket: Ticket,
    pub request: CommandRequest,
    pub result: CommandResult,
}

/// The two tasks behind one ticket: the dispatch itself and the relay
/// that posts its result.
struct InFlight {
    session: AbortHandle,
    relay: JoinHandle<()>,
}

impl InFlight {
    fn abort(self) {
        self.session.abort();
        self.relay.abort();
    }
}

/// Tracks in-flight dispatches and delivers their results in completion
/// order. Concurrent dispatches are not ordered relative to each other.
pub struct DispatchPool<C = TcpConnector> {
    dispatcher: Arc<Dispatcher<C>>,
    tasks: HashMap<Ticket, InFlight>,
    event_tx: mpsc::UnboundedSender<DispatchEvent>,
    event_rx: mpsc::UnboundedReceiver<DispatchEvent>,
    next_ticket: Ticket,
}

impl<C: Connector> DispatchPool<C> {
    pub fn new(dispatcher: Arc<Dispatcher<C>>) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            dispatcher,
            tasks: HashMap::new(),
            event_tx,
            event_rx,
            next_ticket: 1,
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher<C>> {
        &self.dispatcher
    }

    /// Start a dispatch and return its ticket immediately.
    pub fn submit(&mut self, credentials: Credentials, request: CommandRequest) -> Ticket {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let handle = self.dispatcher.spawn(
            credentials,
            request.name.clone(),
            request.raw_argument.clone(),
        );
        let session = handle.abort_handle();
        let event_tx = self.event_tx.clone();
        let relay = tokio::spawn(async move {
            let result = join_dispatch(handle).await;
            let event = DispatchEvent {
                ticket,
                request,
                result,
            };
            if event_tx.send(event).is_err() {
                debug!("dispatch #{ticket} finished after its pool was dropped");
            }
        });

        self.tasks.insert(ticket, InFlight { session, relay });
        debug!("submitted dispatch #{ticket}");
        ticket
    }

    /// Next finished dispatch. Cancel-safe, so it can sit in `select!`.
    pub async fn recv(&mut self) -> Option<DispatchEvent> {
        let event = self.event_rx.recv().await?;
        self.tasks.remove(&event.ticket);
        Some(event)
    }

    /// Wait for a specific ticket. Events for other tickets that arrive
    /// first are handed to `on_other`.
    pub async fn wait_for<F>(&mut self, ticket: Ticket, mut on_other: F) -> Option<DispatchEvent>
    where
        F: FnMut(DispatchEvent),
    {
        while let Some(event) = self.recv().await {
            if event.ticket == ticket {
                return Some(event);
            }
            on_other(event);
        }
        None
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Abort every dispatch in flight, closing its session. A command
    /// already written to the server may still run there.
    pub fn abort_all(&mut self) {
        for (_, in_flight) in self.tasks.drain() {
            in_flight.abort();
        }
    }
}

impl<C> Drop for DispatchPool<C> {
    fn drop(&mut self) {
        for (_, in_flight) in self.tasks.drain() {
            in_flight.abort();
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
