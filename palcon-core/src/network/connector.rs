//! How a session obtains its byte stream.
//!
//! Sessions own their stream directly; the [`Connector`] only opens it.
//! Tests swap in in-memory or counting connectors at this seam.

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::RconError;

/// Opens the transport for one session.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Connect to `addr`, giving up after `timeout`.
    ///
    /// Must fail with [`RconError::ConnectTimeout`] or
    /// [`RconError::ConnectRefused`].
    async fn connect(&self, addr: SocketAddr, timeout: Duration)
    -> Result<Self::Stream, RconError>;
}

/// Plain TCP, the transport real servers speak.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(
        &self,
        addr: SocketAddr,
        timeout: Duration,
    ) -> Result<TcpStream, RconError> {
        debug!("connecting to {addr}");
        let stream = match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) if e.kind() == ErrorKind::TimedOut => {
                return Err(RconError::ConnectTimeout {
                    addr: addr.to_string(),
                    timeout,
                });
            }
            Ok(Err(source)) => {
                return Err(RconError::ConnectRefused {
                    addr: addr.to_string(),
                    source,
                });
            }
            Err(_) => {
                return Err(RconError::ConnectTimeout {
                    addr: addr.to_string(),
                    timeout,
                });
            }
        };
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}
