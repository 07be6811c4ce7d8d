//! Transport Session: one authenticated connection to an RCON server.
//!
//! The session owns its stream and does its own reads and writes through
//! [`RconCodec`]. It is built for one exchange: open, authenticate, send a
//! command, close.
//!
//! The target server answers AUTH correctly but silently drops the
//! response to some valid commands. [`Session::execute`] therefore treats
//! a read timeout, an empty body, or the server hanging up after a
//! successful write as "accepted, no response" and returns an empty
//! string. Failing to *write* the command is still an error.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::codec::RconCodec;
use crate::error::RconError;
use crate::network::{Connector, TcpConnector};
use crate::packet::{AUTH_FAILED_ID, Packet, PacketType};
use crate::sanitizer::SanitizedCommand;
use crate::state::SessionState;

/// Non-AUTH_RESPONSE packets tolerated before the verdict arrives.
const MAX_PACKETS_BEFORE_AUTH_RESPONSE: usize = 8;

// ── SessionOptions ───────────────────────────────────────────────

/// Deadlines applied by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// TCP connect deadline.
    pub connect_timeout: Duration,
    /// Deadline for each write and for the authentication read.
    pub io_timeout: Duration,
    /// How long to wait for a command response before giving up on it.
    pub response_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            io_timeout: Duration::from_secs(5),
            response_timeout: Duration::from_secs(3),
        }
    }
}

// ── Session ──────────────────────────────────────────────────────

/// A single RCON session over stream `S`.
#[derive(Debug)]
pub struct Session<S> {
    framed: Option<Framed<S, RconCodec>>,
    state: SessionState,
    next_id: i32,
    options: SessionOptions,
}

impl Session<TcpStream> {
    /// Open a TCP session to `addr`.
    pub async fn open(addr: SocketAddr, options: SessionOptions) -> Result<Self, RconError> {
        Self::open_with(&TcpConnector, addr, options).await
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Open a session using `connector` for the transport.
    pub async fn open_with<C>(
        connector: &C,
        addr: SocketAddr,
        options: SessionOptions,
    ) -> Result<Self, RconError>
    where
        C: Connector<Stream = S>,
    {
        let mut state = SessionState::default();
        state.begin_connect()?;
        let stream = connector.connect(addr, options.connect_timeout).await?;
        info!("connected to {addr}");
        Ok(Self::attach(stream, state, options))
    }

    /// Wrap an already connected stream. The session starts in `Connecting`.
    pub fn from_stream(stream: S, options: SessionOptions) -> Self {
        Self::attach(stream, SessionState::Connecting, options)
    }

    fn attach(stream: S, state: SessionState, options: SessionOptions) -> Self {
        Self {
            framed: Some(Framed::new(stream, RconCodec)),
            state,
            next_id: 1,
            options,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Returns `true` while the session still holds its stream.
    pub fn is_open(&self) -> bool {
        self.framed.is_some()
    }

    /// Log in with `password`.
    ///
    /// On any failure the stream is released before returning, and the
    /// session never reaches `Ready`.
    pub async fn authenticate(&mut self, password: &str) -> Result<(), RconError> {
        self.state.begin_auth()?;
        let id = self.next_request_id();

        let result = match Packet::auth(id, password) {
            Ok(packet) => self.auth_exchange(packet, id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.state.complete_auth()?;
                debug!("authenticated");
                Ok(())
            }
            Err(RconError::WrongPassword) => {
                info!("server rejected the password");
                self.close().await;
                Err(RconError::WrongPassword)
            }
            Err(e) => {
                self.fail();
                Err(e)
            }
        }
    }

    async fn auth_exchange(&mut self, packet: Packet, id: i32) -> Result<(), RconError> {
        self.write(packet).await?;

        for _ in 0..=MAX_PACKETS_BEFORE_AUTH_RESPONSE {
            let Some(reply) = self.read_within(self.options.io_timeout).await? else {
                return Err(RconError::Transport(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "server closed the connection during authentication",
                )));
            };

            if reply.packet_type() != PacketType::AUTH_RESPONSE {
                debug!("skipping {} packet before auth response", reply.packet_type());
                continue;
            }
            if reply.request_id() == AUTH_FAILED_ID {
                return Err(RconError::WrongPassword);
            }
            if reply.request_id() != id {
                warn!(
                    "auth response id {} does not match request id {id}",
                    reply.request_id()
                );
            }
            return Ok(());
        }

        Err(RconError::MalformedPacket(format!(
            "no auth response within {} packets",
            MAX_PACKETS_BEFORE_AUTH_RESPONSE + 1
        )))
    }

    /// Send a sanitized command and return its response text.
    pub async fn send_command(&mut self, command: &SanitizedCommand) -> Result<String, RconError> {
        self.execute(&command.wire_text()).await
    }

    /// Send a raw command line and return its response text.
    ///
    /// An empty string means the server accepted the command but did not
    /// answer in time.
    pub async fn execute(&mut self, command_line: &str) -> Result<String, RconError> {
        if !self.state.is_ready() {
            return Err(RconError::InvalidState(
                "cannot send command: session not authenticated",
            ));
        }
        let id = self.next_request_id();
        let packet = Packet::command(id, command_line)?;

        if let Err(e) = self.write(packet).await {
            self.fail();
            return Err(e);
        }

        match self.read_within(self.options.response_timeout).await {
            Ok(Some(reply)) => {
                if reply.request_id() != id {
                    debug!(
                        "response id {} does not match request id {id}",
                        reply.request_id()
                    );
                }
                let text = reply.body_text();
                if text.is_empty() {
                    debug!("empty response body");
                }
                Ok(text)
            }
            Ok(None) => {
                debug!("server closed the connection without responding");
                self.close().await;
                Ok(String::new())
            }
            Err(RconError::SessionTimeout(after)) => {
                debug!("no response after {after:?}; command assumed accepted");
                Ok(String::new())
            }
            Err(e) => {
                self.fail();
                Err(e)
            }
        }
    }

    /// Shut down the stream. Safe to call from any state, any number of times.
    pub async fn close(&mut self) {
        if let Some(mut framed) = self.framed.take() {
            if let Err(e) = framed.get_mut().shutdown().await {
                debug!("error while closing session: {e}");
            }
        }
        self.state.close();
    }

    // ── Internals ────────────────────────────────────────────────

    fn next_request_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id = if self.next_id == i32::MAX { 1 } else { self.next_id + 1 };
        id
    }

    /// Drop the stream and mark the session faulted.
    fn fail(&mut self) {
        self.framed = None;
        self.state.fault();
    }

    fn framed(&mut self) -> Result<&mut Framed<S, RconCodec>, RconError> {
        self.framed
            .as_mut()
            .ok_or(RconError::InvalidState("session stream already released"))
    }

    async fn write(&mut self, packet: Packet) -> Result<(), RconError> {
        let limit = self.options.io_timeout;
        let framed = self.framed()?;
        match tokio::time::timeout(limit, framed.send(packet)).await {
            Ok(result) => result,
            Err(_) => Err(RconError::SessionTimeout(limit)),
        }
    }

    /// `Ok(None)` means the server closed the stream on a packet boundary.
    async fn read_within(&mut self, limit: Duration) -> Result<Option<Packet>, RconError> {
        let framed = self.framed()?;
        match tokio::time::timeout(limit, framed.next()).await {
            Ok(Some(result)) => result.map(Some),
            Ok(None) => Ok(None),
            Err(_) => Err(RconError::SessionTimeout(limit)),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
