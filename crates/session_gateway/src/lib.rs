//! # Session Gateway - WebSocket Transport Layer
//!
//! The network edge of the Parlor session server. This crate accepts
//! WebSocket connections, authenticates them, keeps them alive with
//! heartbeats, and shuttles binary envelopes between clients and the
//! dispatch core in `session_core`.
//!
//! ## Architecture
//!
//! * **Server** - Listener setup, accept loops, shutdown coordination
//! * **Connection** - Per-socket lifecycle: one reader, one writer task
//! * **Protocol** - The binary envelope codec (JSON inside binary frames)
//! * **Router** - Maps decoded envelopes onto dispatch-core operations
//! * **Auth** - Pluggable handshake and per-envelope authorization
//! * **Translate** - Envelope bodies to commands, domain events to envelopes
//!
//! ## Design Philosophy
//!
//! The gateway interprets no game rules. It decodes, authenticates, routes,
//! and encodes; everything between "valid command" and "events to send back"
//! belongs to `session_core`. One failed envelope never tears down the
//! connection - only transport-level failures do.

pub mod auth;
pub mod config;
pub mod connection;
pub mod error;
pub mod protocol;
pub mod router;
pub mod server;
pub mod translate;

pub use auth::{AuthContext, AuthError, BearerAuth, ConnectionAuth, OpenAuth};
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use protocol::{Envelope, EnvelopeBody};
pub use router::Router;
pub use server::GatewayServer;
