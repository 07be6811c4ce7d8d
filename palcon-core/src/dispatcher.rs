//! Session Façade: the single entry point the console calls.
//!
//! Every call validates credentials, sanitizes the command, then runs a
//! fresh open → authenticate → send → close exchange. Sessions are never
//! pooled; the session is closed on every exit path.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::credentials::{Credentials, ValidCredentials};
use crate::error::RconError;
use crate::network::{Connector, TcpConnector};
use crate::sanitizer::{self, CommandTable, SanitizedCommand};
use crate::session::{Session, SessionOptions};

/// Default cap on simultaneously open sessions.
pub const DEFAULT_MAX_CONCURRENT_SESSIONS: usize = 4;

/// What a successful dispatch produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Wire name of the command that was sent.
    pub command: String,
    /// Response text. Empty when the server did not answer.
    pub response: String,
}

impl CommandOutput {
    /// Returns `true` when the server accepted the command without replying.
    pub fn is_empty(&self) -> bool {
        self.response.is_empty()
    }
}

pub type CommandResult = Result<CommandOutput, RconError>;

/// Runs commands against a server, one session per call.
pub struct Dispatcher<C = TcpConnector> {
    connector: C,
    table: CommandTable,
    options: SessionOptions,
    permits: Semaphore,
}

impl Dispatcher<TcpConnector> {
    pub fn new(table: CommandTable, options: SessionOptions) -> Self {
        Self::with_connector(TcpConnector, table, options)
    }
}

impl<C: Connector> Dispatcher<C> {
    pub fn with_connector(connector: C, table: CommandTable, options: SessionOptions) -> Self {
        Self {
            connector,
            table,
            options,
            permits: Semaphore::new(DEFAULT_MAX_CONCURRENT_SESSIONS),
        }
    }

    /// Limit how many sessions may be open at once. Extra calls wait.
    pub fn max_concurrent_sessions(mut self, limit: usize) -> Self {
        self.permits = Semaphore::new(limit.max(1));
        self
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Validate, sanitize and send one command.
    ///
    /// Credential and command errors are returned before any connection
    /// is attempted.
    pub async fn dispatch(
        &self,
        credentials: &Credentials,
        command_name: &str,
        argument: &str,
    ) -> CommandResult {
        let valid = credentials.validate()?;
        let command = sanitizer::sanitize(&self.table, command_name, argument)?;
        self.run(&valid, &command).await
    }

    /// Send an already sanitized command.
    pub async fn dispatch_sanitized(
        &self,
        credentials: &Credentials,
        command: &SanitizedCommand,
    ) -> CommandResult {
        let valid = credentials.validate()?;
        self.run(&valid, command).await
    }

    /// Prove the credentials work by sending `Info`.
    pub async fn login(&self, credentials: &Credentials) -> CommandResult {
        let info = SanitizedCommand::new(self.table.lookup("info").unwrap_or("Info"), Vec::new());
        self.dispatch_sanitized(credentials, &info).await
    }

    /// Run [`dispatch`](Self::dispatch) on the runtime's worker threads.
    ///
    /// Task failures (panics, cancellation) come back as
    /// [`RconError::Unexpected`] when the handle is awaited through
    /// [`join_dispatch`].
    pub fn spawn(
        self: &Arc<Self>,
        credentials: Credentials,
        command_name: String,
        argument: String,
    ) -> JoinHandle<CommandResult> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            dispatcher
                .dispatch(&credentials, &command_name, &argument)
                .await
        })
    }

    async fn run(&self, credentials: &ValidCredentials, command: &SanitizedCommand) -> CommandResult {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| RconError::Unexpected(format!("session limiter closed: {e}")))?;

        info!("sending {} to {}", command.wire_name, credentials.addr());
        let mut session =
            Session::open_with(&self.connector, credentials.addr(), self.options).await?;

        let result = async {
            session.authenticate(credentials.password()).await?;
            session.send_command(command).await
        }
        .await;
        session.close().await;

        let response = result?;
        if response.is_empty() {
            debug!("{} accepted without response", command.wire_name);
        }
        Ok(CommandOutput {
            command: command.wire_name.clone(),
            response,
        })
    }
}

/// Await a spawned dispatch, folding task failure into the error type.
pub async fn join_dispatch(handle: JoinHandle<CommandResult>) -> CommandResult {
    handle.await?
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::io::DuplexStream;

    /// Counts connection attempts and always refuses.
    #[derive(Default)]
    struct CountingConnector {
        attempts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Connector for CountingConnector {
        type Stream = DuplexStream;

        async fn connect(
            &self,
            addr: SocketAddr,
            _timeout: Duration,
        ) -> Result<DuplexStream, RconError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(RconError::ConnectRefused {
                addr: addr.to_string(),
                source: std::io::ErrorKind::ConnectionRefused.into(),
            })
        }
    }

    fn dispatcher() -> (Dispatcher<CountingConnector>, Arc<AtomicUsize>) {
        let connector = CountingConnector::default();
        let attempts = Arc::clone(&connector.attempts);
        (
            Dispatcher::with_connector(connector, CommandTable::default(), SessionOptions::default()),
            attempts,
        )
    }

    #[tokio::test]
    async fn invalid_host_makes_no_connection() {
        let (d, attempts) = dispatcher();
        let creds = Credentials::new("999.1.1.1", "25575", "pw");
        let err = d.dispatch(&creds, "info", "").await.unwrap_err();
        assert!(matches!(err, RconError::InvalidCredentials { .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_port_makes_no_connection() {
        let (d, attempts) = dispatcher();
        let creds = Credentials::new("127.0.0.1", "abc", "pw");
        let err = d.dispatch(&creds, "info", "").await.unwrap_err();
        assert!(matches!(err, RconError::InvalidCredentials { .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_command_makes_no_connection() {
        let (d, attempts) = dispatcher();
        let creds = Credentials::new("127.0.0.1", "25575", "pw");
        let err = d.dispatch(&creds, "fly", "").await.unwrap_err();
        assert!(matches!(err, RconError::UnknownCommand(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unencodable_broadcast_makes_no_connection() {
        let (d, attempts) = dispatcher();
        let creds = Credentials::new("127.0.0.1", "25575", "pw");
        let err = d.dispatch(&creds, "broadcast", "5 \u{20AC} each").await.unwrap_err();
        assert!(matches!(err, RconError::Unencodable('\u{20AC}')));
        assert!(err.is_local());
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn connect_failure_is_classified() {
        let (d, attempts) = dispatcher();
        let creds = Credentials::new("127.0.0.1", "25575", "pw");
        let err = d.dispatch(&creds, "save", "").await.unwrap_err();
        assert!(matches!(err, RconError::ConnectRefused { .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn spawned_dispatch_reports_through_handle() {
        let (d, attempts) = dispatcher();
        let d = Arc::new(d);
        let handle = d.spawn(
            Credentials::new("10.0.0.1", "x", "pw"),
            "info".into(),
            String::new(),
        );
        let err = join_dispatch(handle).await.unwrap_err();
        assert!(matches!(err, RconError::InvalidCredentials { .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
    }
}
