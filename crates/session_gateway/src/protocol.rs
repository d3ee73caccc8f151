//! The binary envelope codec.
//!
//! Every frame on the wire is one envelope: a client-chosen correlation id
//! plus a tagged body. Bodies are JSON, adjacently tagged by `type` and
//! `data`, carried inside binary WebSocket frames. Unrecognized body types
//! decode to [`EnvelopeBody::Unknown`] so old gateways tolerate new clients;
//! only structurally malformed frames are rejected.

use serde::{Deserialize, Serialize};
use session_core::Session;

/// Wire code for a frame that could not be decoded as an envelope.
pub const CODE_BAD_ENVELOPE: &str = "BAD_ENVELOPE";

/// Wire code for an envelope rejected by per-envelope authorization.
pub const CODE_AUTH_ERROR: &str = "AUTH_ERROR";

/// One wire message, in either direction.
///
/// The `correlation_id` is opaque to the server: responses to a command echo
/// the id the client sent, so clients can match replies to requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub correlation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<EnvelopeBody>,
}

/// The tagged body union. Client-to-server variants are commands;
/// server-to-client variants are event notifications and errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EnvelopeBody {
    // Client -> server.
    StartSession {
        host_player_id: String,
        game_type: String,
        #[serde(default)]
        ruleset_id: String,
    },
    MovePiece {
        session_id: String,
        from_x: i32,
        from_y: i32,
        to_x: i32,
        to_y: i32,
    },
    UndoMove {
        session_id: String,
    },
    SubmitAnswer {
        session_id: String,
        player_id: String,
        answer: String,
    },
    RevealHint {
        session_id: String,
    },

    // Server -> client.
    SessionStarted {
        session: Session,
        occurred_at: u64,
    },
    PieceMoved {
        session_id: String,
        from_x: i32,
        from_y: i32,
        to_x: i32,
        to_y: i32,
        occurred_at: u64,
    },
    MoveUndone {
        session_id: String,
        occurred_at: u64,
    },
    AnswerAccepted {
        session_id: String,
        player_id: String,
        delta: i64,
        total: i64,
        occurred_at: u64,
    },
    HintRevealed {
        session_id: String,
        hint: String,
        occurred_at: u64,
    },
    Error {
        code: String,
        message: String,
    },

    /// A body type this gateway does not recognize. Routed as a no-op.
    #[serde(other, deserialize_with = "ignore_unknown_data")]
    Unknown,
}

/// Discards whatever `data` payload accompanies an unrecognized body type, so
/// the adjacently tagged decode succeeds instead of expecting a unit value.
fn ignore_unknown_data<'de, D: serde::Deserializer<'de>>(d: D) -> Result<(), D::Error> {
    serde::de::IgnoredAny::deserialize(d).map(|_| ())
}

impl Envelope {
    pub fn new(correlation_id: impl Into<String>, body: EnvelopeBody) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            body: Some(body),
        }
    }

    /// Builds an error envelope echoing the failed request's correlation id.
    pub fn error(
        correlation_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            correlation_id,
            EnvelopeBody::Error {
                code: code.into(),
                message: message.into(),
            },
        )
    }

    /// Encodes the envelope into the bytes of one binary frame.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decodes one binary frame into an envelope.
    ///
    /// Fails only on structural problems; an unknown body `type` succeeds
    /// with [`EnvelopeBody::Unknown`].
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
