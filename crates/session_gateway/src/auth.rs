//! Pluggable connection authorization.
//!
//! The gateway consults an authorizer at two points: once during the HTTP
//! upgrade (reject before the socket ever becomes a WebSocket) and once per
//! decoded envelope (reject a single message without dropping the
//! connection). The per-envelope hook returns the context to carry forward,
//! so an authorizer can refresh or enrich the identity as the connection
//! lives on - a token refresh, an elevated role, a per-frame nonce. Both
//! hooks are synchronous; authorizers that need I/O should resolve it at
//! construction time.

use crate::protocol::Envelope;
use thiserror::Error;
use tokio_tungstenite::tungstenite::http::HeaderMap;

/// Authorization failures, at handshake or per envelope.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingCredentials,

    #[error("authorization header is not a bearer token")]
    MalformedCredentials,

    #[error("invalid bearer token")]
    InvalidToken,

    /// Catch-all for custom authorizer policies.
    #[error("{0}")]
    Denied(String),
}

/// Identity established during the handshake, then re-threaded through
/// every per-envelope check.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    /// Who the connection authenticated as. Opaque to the gateway.
    pub subject: String,
}

/// The authorization contract.
pub trait ConnectionAuth: Send + Sync {
    /// Called during the HTTP upgrade with the request headers. An error
    /// rejects the handshake with `401 Unauthorized`.
    fn on_connect(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError>;

    /// Called for every decoded envelope with the current context. On
    /// success the returned context (updated or not) replaces the current
    /// one for subsequent envelopes. An error turns into an error envelope
    /// on the wire; the connection and its context stay as they were.
    fn on_envelope(
        &self,
        context: &AuthContext,
        envelope: &Envelope,
    ) -> Result<AuthContext, AuthError>;
}

/// Accepts every connection and every envelope. Development default.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAuth;

impl ConnectionAuth for OpenAuth {
    fn on_connect(&self, _headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        Ok(AuthContext {
            subject: "anonymous".to_string(),
        })
    }

    fn on_envelope(
        &self,
        context: &AuthContext,
        _envelope: &Envelope,
    ) -> Result<AuthContext, AuthError> {
        Ok(context.clone())
    }
}

/// Shared-secret bearer token check against the `Authorization` header.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    token: String,
}

impl BearerAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl ConnectionAuth for BearerAuth {
    fn on_connect(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        let header = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingCredentials)?;

        let presented = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MalformedCredentials)?;

        if presented != self.token {
            return Err(AuthError::InvalidToken);
        }

        Ok(AuthContext {
            subject: "bearer".to_string(),
        })
    }

    fn on_envelope(
        &self,
        context: &AuthContext,
        _envelope: &Envelope,
    ) -> Result<AuthContext, AuthError> {
        Ok(context.clone())
    }
}
