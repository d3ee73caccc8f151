//! Event sink contract for publishing domain events to external systems.

use crate::errors::SinkError;
use async_trait::async_trait;
use tracing::debug;

/// Fire-and-forget publication of domain events.
///
/// Implementations may be a message broker, a webhook fan-out, anything.
/// Callers never block the command path on a publish failure - the command
/// has already committed by the time events go out.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), SinkError>;
}

/// A sink that logs and drops every event. Default for development.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

#[async_trait]
impl EventSink for NullSink {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), SinkError> {
        debug!(topic, %payload, "event sink (null): dropping event");
        Ok(())
    }
}
