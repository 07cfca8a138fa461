//! Progressive checkpoint state machine
//!
//! - [`ledger`]: the fixed, ordered step catalogue
//! - [`answers`]: typed answer record and answer-keys
//! - [`engine`]: runs one step's checkpoint against persisted state
//! - [`context`]: projects state into the payload handed to the assistant

pub mod answers;
pub mod context;
pub mod engine;
pub mod ledger;

pub use answers::{AnswerKey, Answers, Audience, Constraint, QualityLevel};
pub use context::{ContextAssembler, ContextPayload};
pub use engine::{
    Checkpoint, CheckpointEngine, CheckpointError, EngineOptions, ResumePoint, Resumed,
};
pub use ledger::{StepDefinition, StepId, StepLedger, UnknownStepError};
