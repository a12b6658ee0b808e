//! Language server client: a websocket JSON-RPC session plus the typed
//! symbol queries the graph indexer needs.

pub mod config;
pub mod error;
pub mod protocol;
pub mod queries;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use session::LspSession;
pub use transport::{Connector, Transport, TransportError, WebSocketConnector, WebSocketTransport};
