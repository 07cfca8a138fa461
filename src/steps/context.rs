//! Context payload assembly for the assistant launcher

use serde::Serialize;

use super::answers::Answers;
use super::ledger::{StepId, StepLedger};
use crate::state::WorkflowState;

/// Read-only snapshot of state scoped to one step.
///
/// This is the only thing handed to the assistant launcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextPayload {
    pub project_name: String,
    pub step: StepId,
    /// Spec Kit command this step authorizes
    pub command: &'static str,
    pub answers: Answers,
    pub completed_steps: Vec<StepId>,
}

impl ContextPayload {
    pub fn is_build(&self) -> bool {
        self.step == StepLedger::last()
    }
}

/// Pure projection of [`WorkflowState`] into [`ContextPayload`]
pub struct ContextAssembler;

impl ContextAssembler {
    pub fn assemble(state: &WorkflowState, step: StepId) -> ContextPayload {
        ContextPayload {
            project_name: state.project_name.clone(),
            step,
            command: StepLedger::command_for(step),
            answers: state.answers.clone(),
            completed_steps: state.completed_steps.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::Audience;

    #[test]
    fn test_assemble_snapshots_state() {
        let mut state = WorkflowState {
            project_name: "demo".to_string(),
            completed_steps: vec![StepId::Constitution],
            ..Default::default()
        };
        state.answers.audience = Some(Audience::Team);
        let before = state.clone();

        let payload = ContextAssembler::assemble(&state, StepId::Spec);
        assert_eq!(state, before);
        assert_eq!(payload.project_name, "demo");
        assert_eq!(payload.step, StepId::Spec);
        assert_eq!(payload.command, "/speckit.specify");
        assert_eq!(payload.answers.audience, Some(Audience::Team));
        assert_eq!(payload.completed_steps, vec![StepId::Constitution]);
        assert!(!payload.is_build());

        // Later mutation does not leak into the snapshot
        state.completed_steps.push(StepId::Spec);
        assert_eq!(payload.completed_steps.len(), 1);
    }

    #[test]
    fn test_payload_serializes_step_names() {
        let payload = ContextAssembler::assemble(&WorkflowState::default(), StepId::Build);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["step"], "build");
        assert_eq!(json["command"], "/speckit.implement");
        assert!(payload.is_build());
    }
}
