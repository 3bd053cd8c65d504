//! Progress Events
//!
//! The orchestrator reports progress through an [`EventSink`]. Collecting
//! mode passes [`NullSink`]; progressive mode forwards events to the client
//! over a channel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Terminal artifact of one orchestration run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentReply {
    /// Final natural-language reply (never blank)
    pub reply: String,

    /// Whether a tool round took place
    pub tool_used: bool,
}

impl AgentReply {
    pub fn new(reply: impl Into<String>, tool_used: bool) -> Self {
        Self {
            reply: reply.into(),
            tool_used,
        }
    }
}

/// One event in a progressive response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Work in progress
    Status { message: String },

    /// Successful end of the run
    Result(AgentReply),

    /// Failed end of the run
    Error { message: String },
}

impl StreamEvent {
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Whether this event ends the stream
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Result(_) | Self::Error { .. })
    }
}

/// Receives events as the orchestrator moves between states
#[async_trait]
pub trait EventSink: Send {
    async fn emit(&mut self, event: StreamEvent);
}

/// Discards every event
pub struct NullSink;

#[async_trait]
impl EventSink for NullSink {
    async fn emit(&mut self, _event: StreamEvent) {}
}

/// Collects events in memory
#[async_trait]
impl EventSink for Vec<StreamEvent> {
    async fn emit(&mut self, event: StreamEvent) {
        self.push(event);
    }
}

/// Forwards events to a channel until the receiver goes away.
///
/// Once a send fails the sink stays closed: nothing more is written after a
/// disconnect, and nothing at all after the terminal event.
pub struct ChannelSink {
    tx: mpsc::Sender<StreamEvent>,
    open: bool,
}

impl ChannelSink {
    pub const fn new(tx: mpsc::Sender<StreamEvent>) -> Self {
        Self { tx, open: true }
    }

    pub const fn is_open(&self) -> bool {
        self.open
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn emit(&mut self, event: StreamEvent) {
        if !self.open {
            return;
        }

        let terminal = event.is_terminal();
        if self.tx.send(event).await.is_err() {
            tracing::debug!("Event receiver dropped, closing sink");
            self.open = false;
            return;
        }

        if terminal {
            self.open = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let status = serde_json::to_value(StreamEvent::status("Analyzing your question...")).unwrap();
        assert_eq!(
            status,
            serde_json::json!({"type": "status", "message": "Analyzing your question..."})
        );

        let result = serde_json::to_value(StreamEvent::Result(AgentReply::new("Sunny.", true))).unwrap();
        assert_eq!(
            result,
            serde_json::json!({"type": "result", "reply": "Sunny.", "tool_used": true})
        );

        let error = serde_json::to_value(StreamEvent::error("nope")).unwrap();
        assert_eq!(error, serde_json::json!({"type": "error", "message": "nope"}));
    }

    #[tokio::test]
    async fn test_channel_sink_stops_after_terminal() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut sink = ChannelSink::new(tx);

        sink.emit(StreamEvent::status("one")).await;
        sink.emit(StreamEvent::error("done")).await;
        sink.emit(StreamEvent::status("late")).await;
        drop(sink);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(events, vec![StreamEvent::status("one"), StreamEvent::error("done")]);
    }

    #[tokio::test]
    async fn test_channel_sink_closes_on_disconnect() {
        let (tx, rx) = mpsc::channel(8);
        let mut sink = ChannelSink::new(tx);
        drop(rx);

        sink.emit(StreamEvent::status("nobody listening")).await;
        assert!(!sink.is_open());
    }
}
