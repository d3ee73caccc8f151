//! Gateway error types.

use thiserror::Error;

/// Errors that terminate gateway startup or a connection.
///
/// Per-envelope failures are not represented here - those become error
/// envelopes on the wire and the connection continues.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Socket creation, bind, or listen failed.
    #[error("Network error: {0}")]
    Network(String),

    /// The WebSocket upgrade failed or was rejected.
    #[error("Handshake error: {0}")]
    Handshake(String),

    /// Anything else that should stop the server.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::Network(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for GatewayError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        GatewayError::Handshake(err.to_string())
    }
}
