use crate::transport::TransportError;
use symgraph_api::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid server address: {0}")]
    InvalidAddress(#[from] url::ParseError),
    #[error("Unable to connect to {address} after {attempts} attempts")]
    Unreachable { address: String, attempts: u32 },
    #[error("Session is not connected")]
    NotConnected,
    #[error("Connection lost while waiting for response {id} ({attempts} reconnect attempts)")]
    ConnectionLost { id: u64, attempts: u32 },
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("Server returned error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Request {method} (id {id}) timed out")]
    Timeout { method: String, id: u64 },
    #[error("Malformed server reply: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SessionError {
    /// The socket is gone; nothing more can be sent on this session.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            SessionError::NotConnected
                | SessionError::ConnectionLost { .. }
                | SessionError::Transport(TransportError::Closed)
        )
    }

    /// Server-reported and decode failures stay scoped to the query that caused
    /// them; everything else means the backend is gone.
    pub fn into_api(self, method: &str) -> ApiError {
        match self {
            SessionError::Rpc { .. } | SessionError::Decode(_) => {
                ApiError::query(method, self.to_string())
            }
            other => ApiError::Unavailable(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
