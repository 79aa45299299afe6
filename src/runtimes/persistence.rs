/*!
Persistence primitives for serializing run checkpoints.

Explicit serde-friendly shapes, decoupled from in-memory types, with the
conversion logic localized here so checkpointer backends stay lean. The
pipeline state itself is already a flat serde record, so the persisted
checkpoint is a thin envelope: identity, step counter, graph position, state,
and a creation timestamp.

This module performs no I/O.
*/

use chrono::Utc;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runtimes::checkpointer::RunCheckpoint;
use crate::state::PipelineState;
use crate::types::StepId;

/// Persisted shape of one run checkpoint.
///
/// `position` is the encoded [`StepId`] the run will execute next; `None`
/// means the run already completed. `created_at` is RFC3339 to keep
/// `chrono::DateTime` out of the serialized shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedCheckpoint {
    pub run_id: String,
    pub step: u64,
    #[serde(default)]
    pub position: Option<String>,
    pub state: PipelineState,
    pub created_at: String,
}

/// Conversion and serialization errors for persistence models.
#[derive(Debug, Error, Diagnostic)]
pub enum PersistenceError {
    #[error("checkpoint references unknown step: {0}")]
    #[diagnostic(
        code(newsreel::persistence::unknown_step),
        help("The checkpoint was written by an incompatible graph; discard it or migrate the step id.")
    )]
    UnknownStep(String),

    #[error("JSON serialization/deserialization failed: {source}")]
    #[diagnostic(code(newsreel::persistence::serde))]
    Serde {
        #[source]
        source: serde_json::Error,
    },
}

impl From<&RunCheckpoint> for PersistedCheckpoint {
    fn from(cp: &RunCheckpoint) -> Self {
        PersistedCheckpoint {
            run_id: cp.run_id.clone(),
            step: cp.step,
            position: cp.position.map(|id| id.encode().to_string()),
            state: cp.state.clone(),
            created_at: cp.created_at.to_rfc3339(),
        }
    }
}

impl TryFrom<PersistedCheckpoint> for RunCheckpoint {
    type Error = PersistenceError;

    fn try_from(p: PersistedCheckpoint) -> Result<Self, PersistenceError> {
        let position = match p.position {
            Some(encoded) => {
                Some(StepId::decode(&encoded).ok_or(PersistenceError::UnknownStep(encoded))?)
            }
            None => None,
        };
        let created_at = chrono::DateTime::parse_from_rfc3339(&p.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        Ok(RunCheckpoint {
            run_id: p.run_id,
            step: p.step,
            position,
            state: p.state,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Checkpoint;

    #[test]
    fn checkpoint_round_trip_preserves_everything() {
        let state = PipelineState::for_topic("round trip").suspended_at(Checkpoint::Script);
        let original = RunCheckpoint {
            run_id: "run-1".to_string(),
            step: 5,
            position: Some(StepId::ScriptGate),
            state,
            created_at: Utc::now(),
        };

        let persisted = PersistedCheckpoint::from(&original);
        let json = serde_json::to_string(&persisted).unwrap();
        let parsed: PersistedCheckpoint = serde_json::from_str(&json).unwrap();
        let restored = RunCheckpoint::try_from(parsed).unwrap();

        assert_eq!(restored.run_id, original.run_id);
        assert_eq!(restored.step, original.step);
        assert_eq!(restored.position, original.position);
        assert_eq!(restored.state, original.state);
    }

    #[test]
    fn unknown_position_is_rejected() {
        let persisted = PersistedCheckpoint {
            run_id: "run-1".to_string(),
            step: 1,
            position: Some("definitely_not_a_step".to_string()),
            state: PipelineState::for_topic("t"),
            created_at: Utc::now().to_rfc3339(),
        };
        assert!(matches!(
            RunCheckpoint::try_from(persisted),
            Err(PersistenceError::UnknownStep(_))
        ));
    }
}
