//! Operator-supplied login details and their validation.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use crate::error::{CredentialField, RconError};

/// Host, port and password exactly as the operator typed them.
///
/// Built fresh for every call and never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub port: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        host: impl Into<String>,
        port: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
            password: password.into(),
        }
    }

    /// Check host and port syntax. Reports every failing field at once.
    pub fn validate(&self) -> Result<ValidCredentials, RconError> {
        let host = self.host.trim().parse::<Ipv4Addr>();
        let port = self
            .port
            .trim()
            .parse::<u16>()
            .ok()
            .filter(|&p| p != 0);

        match (host, port) {
            (Ok(ip), Some(port)) => Ok(ValidCredentials {
                addr: SocketAddrV4::new(ip, port),
                password: self.password.clone(),
            }),
            (host, port) => {
                let mut fields = Vec::new();
                if host.is_err() {
                    fields.push(CredentialField::Host);
                }
                if port.is_none() {
                    fields.push(CredentialField::Port);
                }
                Err(RconError::InvalidCredentials { fields })
            }
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Credentials whose address has been parsed.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidCredentials {
    addr: SocketAddrV4,
    password: String,
}

impl ValidCredentials {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::V4(self.addr)
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for ValidCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidCredentials")
            .field("addr", &self.addr)
            .field("password", &"<redacted>")
            .finish()
    }
}
