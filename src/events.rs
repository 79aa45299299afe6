//! Progress events emitted while a run advances.
//!
//! Stages and the runner emit [`PipelineEvent`]s through a flume channel so a
//! driver or UI can follow progress in real time. Events are strictly
//! cosmetic: nothing in the engine reads them back, and a disconnected
//! subscriber never affects control flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One observable moment in a run: a stage starting, a pause notice, a
/// per-item retry, and so on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub when: DateTime<Utc>,
    /// Encoded step id of the emitting node, when node-scoped.
    pub node: Option<String>,
    /// Step counter at emission time, when node-scoped.
    pub step: Option<u64>,
    /// Short category label, e.g. `"stage"`, `"gate"`, `"retry"`.
    pub scope: String,
    pub message: String,
}

impl PipelineEvent {
    /// Create a runner-scoped event with no node metadata.
    pub fn scoped(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            when: Utc::now(),
            node: None,
            step: None,
            scope: scope.into(),
            message: message.into(),
        }
    }

    /// Create a node-scoped event carrying the emitting step's identity.
    pub fn node_scoped(
        node: impl Into<String>,
        step: u64,
        scope: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            when: Utc::now(),
            node: Some(node.into()),
            step: Some(step),
            scope: scope.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.node, self.step) {
            (Some(node), Some(step)) => {
                write!(f, "[{step}:{node}] {}: {}", self.scope, self.message)
            }
            _ => write!(f, "{}: {}", self.scope, self.message),
        }
    }
}

/// Cloneable sending half handed to stages via their context.
///
/// Emission is fire-and-forget: when every subscriber is gone the event is
/// dropped with a trace log, never an error the stage has to handle.
#[derive(Clone, Debug)]
pub struct EventEmitter {
    tx: flume::Sender<PipelineEvent>,
}

impl EventEmitter {
    pub fn emit(&self, event: PipelineEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("event channel disconnected; progress event dropped");
        }
    }
}

/// Unbounded channel pairing an [`EventEmitter`] with subscriber receivers.
///
/// One channel exists per runner; the driver subscribes, the runner and every
/// stage context share clones of the emitter.
pub struct EventChannel {
    tx: flume::Sender<PipelineEvent>,
    rx: flume::Receiver<PipelineEvent>,
}

impl EventChannel {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self { tx, rx }
    }

    /// A cloneable emitter for producers.
    #[must_use]
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            tx: self.tx.clone(),
        }
    }

    /// A receiver for consumers. Multiple subscribers share the queue; each
    /// event is delivered to exactly one of them.
    #[must_use]
    pub fn subscribe(&self) -> flume::Receiver<PipelineEvent> {
        self.rx.clone()
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}
