//! The fixed catalogue of workflow steps.
//!
//! `constitution -> spec -> plan -> tasks -> validate -> build`
//!
//! Pure lookup data. A step's checkpoint collects the answer-keys listed
//! here; confirming it closes the *previous* step in the ledger (see
//! [`StepLedger::predecessor`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::answers::AnswerKey;
use crate::questions::Question;
use crate::state::WorkflowState;

/// Identifier of a workflow step. Declaration order is ledger order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Constitution,
    Spec,
    Plan,
    Tasks,
    Validate,
    Build,
}

impl StepId {
    pub fn as_str(self) -> &'static str {
        match self {
            StepId::Constitution => "constitution",
            StepId::Spec => "spec",
            StepId::Plan => "plan",
            StepId::Tasks => "tasks",
            StepId::Validate => "validate",
            StepId::Build => "build",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step identifier outside the fixed ledger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown step '{0}' (valid steps: constitution, spec, plan, tasks, validate, build)")]
pub struct UnknownStepError(pub String);

impl FromStr for StepId {
    type Err = UnknownStepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepLedger::steps()
            .iter()
            .map(|d| d.id)
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownStepError(s.to_string()))
    }
}

/// Static description of one step
#[derive(Debug, Clone, Copy)]
pub struct StepDefinition {
    pub id: StepId,
    /// Human label, e.g. "Requirements"
    pub label: &'static str,
    /// Spec Kit command the assistant runs for this step
    pub command: &'static str,
    /// Answer-keys this step's checkpoint is responsible for
    pub answers: &'static [AnswerKey],
    /// "Proceed with this step now?" prompt
    pub confirm: Question,
}

const LEDGER: [StepDefinition; 6] = [
    StepDefinition {
        id: StepId::Constitution,
        label: "Project Foundation",
        command: "/speckit.constitution",
        answers: &[
            AnswerKey::ProjectName,
            AnswerKey::BigPicture,
            AnswerKey::Audience,
        ],
        confirm: Question::new("confirm_constitution", "Create constitution now?"),
    },
    StepDefinition {
        id: StepId::Spec,
        label: "Requirements",
        command: "/speckit.specify",
        answers: &[AnswerKey::Features, AnswerKey::Constraints],
        confirm: Question::new("confirm_spec", "Create spec now?"),
    },
    StepDefinition {
        id: StepId::Plan,
        label: "Technical Approach",
        command: "/speckit.plan",
        answers: &[AnswerKey::TechStack, AnswerKey::QualityLevel],
        confirm: Question::new("confirm_plan", "Create plan now?"),
    },
    StepDefinition {
        id: StepId::Tasks,
        label: "Task Breakdown",
        command: "/speckit.tasks",
        answers: &[],
        confirm: Question::new("confirm_tasks", "Ready to generate tasks?"),
    },
    StepDefinition {
        id: StepId::Validate,
        label: "Validation",
        command: "/speckit.checklist",
        answers: &[],
        confirm: Question::new("confirm_validate", "Ready to validate?"),
    },
    StepDefinition {
        id: StepId::Build,
        label: "Ready to Build",
        command: "/speckit.implement",
        answers: &[],
        confirm: Question::new("confirm_build", "Ready to start building?"),
    },
];

/// Lookup over the fixed step catalogue
pub struct StepLedger;

impl StepLedger {
    /// All steps in order
    pub fn steps() -> &'static [StepDefinition] {
        &LEDGER
    }

    pub fn definition(step: StepId) -> &'static StepDefinition {
        &LEDGER[Self::position(step)]
    }

    /// Zero-based position in the ledger
    pub fn position(step: StepId) -> usize {
        step as usize
    }

    pub fn first() -> StepId {
        LEDGER[0].id
    }

    pub fn last() -> StepId {
        LEDGER[LEDGER.len() - 1].id
    }

    pub fn successor(step: StepId) -> Option<StepId> {
        LEDGER.get(Self::position(step) + 1).map(|d| d.id)
    }

    /// The step whose completion is finalized when `step` is confirmed
    pub fn predecessor(step: StepId) -> Option<StepId> {
        Self::position(step)
            .checked_sub(1)
            .map(|i| LEDGER[i].id)
    }

    pub fn required_answers(step: StepId) -> &'static [AnswerKey] {
        Self::definition(step).answers
    }

    pub fn command_for(step: StepId) -> &'static str {
        Self::definition(step).command
    }

    pub fn label(step: StepId) -> &'static str {
        Self::definition(step).label
    }

    /// First step not yet recorded as complete; `None` once every step is
    pub fn next_incomplete(state: &WorkflowState) -> Option<StepId> {
        LEDGER
            .iter()
            .map(|d| d.id)
            .find(|id| !state.completed_steps.contains(id))
    }
}
