//! Walk event stream for observers.
//!
//! Emits [`WalkEvent`]s over a [`tokio::sync::broadcast`] channel so that
//! loggers, recorders, or a UI can follow a walk without touching the engine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WalkEvent {
    WalkStarted {
        graph: String,
        walker_id: String,
        start: String,
    },
    NodeEntered {
        walker_id: String,
        node: String,
    },
    NodeExited {
        walker_id: String,
        node: String,
        artifact_type: String,
        confidence: f64,
        elapsed_ms: u64,
    },
    EdgeMatched {
        walker_id: String,
        edge_id: String,
        from: String,
        to: String,
        explanation: String,
    },
    WalkCompleted {
        walker_id: String,
        steps: usize,
    },
    WalkFailed {
        walker_id: String,
        node: String,
        error: String,
    },
}

impl WalkEvent {
    pub fn walker_id(&self) -> &str {
        match self {
            WalkEvent::WalkStarted { walker_id, .. }
            | WalkEvent::NodeEntered { walker_id, .. }
            | WalkEvent::NodeExited { walker_id, .. }
            | WalkEvent::EdgeMatched { walker_id, .. }
            | WalkEvent::WalkCompleted { walker_id, .. }
            | WalkEvent::WalkFailed { walker_id, .. } => walker_id,
        }
    }
}

/// Event emitter wrapping a broadcast sender.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    sender: tokio::sync::broadcast::Sender<WalkEvent>,
}

impl EventEmitter {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(capacity);
        Self { sender }
    }

    /// Sends to current subscribers. Dropped silently when nobody listens.
    pub fn emit(&self, event: WalkEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<WalkEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(256)
    }
}
