pub mod connector;

pub use connector::{Connector, TcpConnector};
