//! Socket plumbing under the session: one JSON-RPC message per frame.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::io::ErrorKind;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection refused")]
    Refused,
    #[error("Connection closed")]
    Closed,
    #[error("{0}")]
    Other(String),
}

/// A connected, message-oriented channel to the language server.
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, frame: &str) -> Result<(), TransportError>;

    /// Next text message from the server. Control frames are not surfaced.
    async fn recv(&mut self) -> Result<String, TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Opens transports; the session calls it again to reconnect.
#[async_trait]
pub trait Connector: Send + Sync {
    type Transport: Transport;

    async fn connect(&self, address: &str) -> Result<Self::Transport, TransportError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    type Transport = WebSocketTransport;

    async fn connect(&self, address: &str) -> Result<WebSocketTransport, TransportError> {
        let (stream, _) = tokio_tungstenite::connect_async(address)
            .await
            .map_err(classify)?;
        Ok(WebSocketTransport { stream })
    }
}

pub struct WebSocketTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        self.stream
            .send(Message::text(frame.to_owned()))
            .await
            .map_err(classify)
    }

    async fn recv(&mut self) -> Result<String, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_owned()),
                Some(Ok(Message::Binary(bytes))) => {
                    return String::from_utf8(bytes.to_vec())
                        .map_err(|e| TransportError::Other(e.to_string()));
                }
                Some(Ok(Message::Close(_))) | None => return Err(TransportError::Closed),
                // ping/pong are answered by tungstenite itself
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(classify(e)),
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.stream.close(None).await.map_err(classify)
    }
}

fn classify(err: WsError) -> TransportError {
    match err {
        WsError::ConnectionClosed | WsError::AlreadyClosed => TransportError::Closed,
        WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) => TransportError::Closed,
        WsError::Io(io) => match io.kind() {
            ErrorKind::ConnectionRefused => TransportError::Refused,
            ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof => TransportError::Closed,
            _ => TransportError::Other(io.to_string()),
        },
        other => TransportError::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_closed_conditions() {
        assert!(matches!(
            classify(WsError::ConnectionClosed),
            TransportError::Closed
        ));
        assert!(matches!(
            classify(WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake)),
            TransportError::Closed
        ));
        assert!(matches!(
            classify(WsError::Io(std::io::Error::from(ErrorKind::BrokenPipe))),
            TransportError::Closed
        ));
    }

    #[test]
    fn test_classify_refused() {
        assert!(matches!(
            classify(WsError::Io(std::io::Error::from(
                ErrorKind::ConnectionRefused
            ))),
            TransportError::Refused
        ));
    }
}
