//! Checkpoint engine: runs one step's checkpoint against persisted state.
//!
//! A checkpoint asks only for the answer-keys that are still missing, then
//! asks whether to proceed. Declining persists whatever was collected and
//! pauses. Confirming closes the *previous* step in the ledger, moves the
//! cursor to the next step and returns the context payload for this one.
//!
//! Completion therefore lags one step behind confirmation: `constitution`
//! is recorded as complete only once the `spec` checkpoint is confirmed.

use std::io;
use thiserror::Error;

use super::answers::{AnswerKey, Answers, Audience, Constraint, QualityLevel};
use super::context::{ContextAssembler, ContextPayload};
use super::ledger::{StepId, StepLedger, UnknownStepError};
use crate::questions::QuestionSource;
use crate::state::{Cursor, LoadWarning, StateStore, StoreError, WorkflowState};

/// Prompts asked while collecting answers
pub mod prompts {
    use super::Constraint;
    use crate::questions::Question;

    pub const PROJECT_NAME: Question =
        Question::new("project_name", "What should we call this project?");
    pub const BIG_PICTURE: Question =
        Question::new("big_picture", "In 1-2 sentences, what does this do?");
    pub const AUDIENCE: Question = Question::new("audience", "Who will use this?");
    pub const FEATURES: Question = Question::new(
        "features",
        "What are the 2-3 most important features?",
    );
    pub const OFFLINE: Question = Question::new("constraint_offline", "Must work offline?");
    pub const MOBILE: Question =
        Question::new("constraint_mobile", "Mobile/tablet support needed?");
    pub const SECURITY: Question = Question::new("constraint_security", "Extra security?");
    pub const PERFORMANCE: Question =
        Question::new("constraint_performance", "High performance?");
    pub const HAS_TECH_PREFERENCE: Question = Question::new(
        "tech_preference",
        "Do you have preferred technologies?",
    );
    pub const TECH_STACK: Question = Question::new("tech_stack", "What technologies?");
    pub const QUALITY_LEVEL: Question =
        Question::new("quality_level", "What's the quality approach?");

    /// Yes/no prompt for one constraint
    pub fn constraint(constraint: Constraint) -> &'static Question {
        match constraint {
            Constraint::Offline => &OFFLINE,
            Constraint::Mobile => &MOBILE,
            Constraint::Security => &SECURITY,
            Constraint::Performance => &PERFORMANCE,
        }
    }
}

const DEFAULT_FEATURES: &str = "Core functionality, user interface, data management";
const QUICK_FEATURES: &str = "Core functionality";
const AUTO_TECH_STACK: &str = "auto";

/// Outcome of a checkpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checkpoint {
    /// Confirmed; hand this payload to the assistant
    Ready(ContextPayload),
    /// Declined; partial answers were persisted, the ledger is unchanged
    Paused,
}

/// Where a resumed workflow re-enters the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumePoint {
    Checkpoint(StepId),
    /// Every step is recorded as complete
    Finished,
}

/// State loaded for a resume, with the re-entry point
#[derive(Debug)]
pub struct Resumed {
    pub state: WorkflowState,
    pub warning: Option<LoadWarning>,
    pub point: ResumePoint,
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error(transparent)]
    UnknownStep(#[from] UnknownStepError),

    #[error("step '{step}' is not ready yet (the workflow is at '{current}')")]
    NotReady { step: StepId, current: Cursor },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to read answer: {0}")]
    Input(#[from] io::Error),
}

/// Engine behaviour switches
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Treat every "proceed now?" confirmation as accepted
    pub auto_confirm: bool,
    /// Default offered when asking for the project name
    pub default_project_name: String,
    /// Default offered for the quality approach
    pub default_quality: QualityLevel,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            auto_confirm: false,
            default_project_name: "my-project".to_string(),
            default_quality: QualityLevel::Production,
        }
    }
}

/// Runs checkpoints and persists every state mutation through its store
pub struct CheckpointEngine {
    store: StateStore,
    options: EngineOptions,
}

impl CheckpointEngine {
    pub fn new(store: StateStore, options: EngineOptions) -> Self {
        Self { store, options }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// [`Self::run_checkpoint`] for a step given by name
    pub fn run_named(
        &self,
        step: &str,
        state: &mut WorkflowState,
        questions: &mut dyn QuestionSource,
    ) -> Result<Checkpoint, CheckpointError> {
        let step: StepId = step.parse()?;
        self.run_checkpoint(step, state, questions)
    }

    /// Run the checkpoint for `step`.
    ///
    /// Re-running a step that is already complete asks nothing and mutates
    /// nothing; it only re-derives the payload.
    pub fn run_checkpoint(
        &self,
        step: StepId,
        state: &mut WorkflowState,
        questions: &mut dyn QuestionSource,
    ) -> Result<Checkpoint, CheckpointError> {
        if state.is_complete(step) {
            tracing::debug!(step = %step, "Step already complete, re-deriving context");
            return Ok(Checkpoint::Ready(ContextAssembler::assemble(state, step)));
        }

        if StepLedger::position(step) > state.current_step.position() {
            return Err(CheckpointError::NotReady {
                step,
                current: state.current_step,
            });
        }

        for &key in StepLedger::required_answers(step) {
            if !state.has_answer(key) {
                self.collect(key, state, questions)?;
                self.store.save(state)?;
            }
        }

        let confirm = &StepLedger::definition(step).confirm;
        let proceed = self.options.auto_confirm || questions.ask_confirm(confirm, true)?;
        if !proceed {
            self.store.save(state)?;
            tracing::info!(step = %step, "Checkpoint paused");
            return Ok(Checkpoint::Paused);
        }

        Self::advance(step, state);
        self.store.save(state)?;
        tracing::info!(
            step = %step,
            current_step = %state.current_step,
            completed = state.completed_steps.len(),
            "Checkpoint confirmed"
        );

        Ok(Checkpoint::Ready(ContextAssembler::assemble(state, step)))
    }

    /// Record the transition out of the step before `step` and move the cursor
    fn advance(step: StepId, state: &mut WorkflowState) {
        if let Some(previous) = StepLedger::predecessor(step) {
            state.mark_complete(previous);
        }

        // The final step has no successor; the cursor stays on it
        let next = StepLedger::successor(step).unwrap_or(step);
        if StepLedger::position(next) >= state.current_step.position() {
            state.current_step = Cursor::Step(next);
        }
    }

    /// Ask for one missing answer and store it
    fn collect(
        &self,
        key: AnswerKey,
        state: &mut WorkflowState,
        questions: &mut dyn QuestionSource,
    ) -> io::Result<()> {
        match key {
            AnswerKey::ProjectName => {
                state.project_name =
                    questions.ask_text(&prompts::PROJECT_NAME, &self.options.default_project_name)?;
            }
            AnswerKey::BigPicture => {
                let default = format!("A {} application", state.project_name);
                state.answers.big_picture =
                    Some(questions.ask_text(&prompts::BIG_PICTURE, &default)?);
            }
            AnswerKey::Audience => {
                let fallback = Audience::Personal;
                let id = questions.ask_choice(
                    &prompts::AUDIENCE,
                    Audience::OPTIONS,
                    fallback.as_str(),
                )?;
                state.answers.audience = Some(Audience::from_id(&id).unwrap_or(fallback));
            }
            AnswerKey::Features => {
                state.answers.features =
                    Some(questions.ask_text(&prompts::FEATURES, DEFAULT_FEATURES)?);
            }
            AnswerKey::Constraints => {
                let mut constraints = Vec::new();
                for constraint in Constraint::ALL {
                    if questions.ask_confirm(prompts::constraint(constraint), false)? {
                        constraints.push(constraint);
                    }
                }
                state.answers.constraints = Some(constraints);
            }
            AnswerKey::TechStack => {
                let stack = if questions.ask_confirm(&prompts::HAS_TECH_PREFERENCE, false)? {
                    questions.ask_text(&prompts::TECH_STACK, AUTO_TECH_STACK)?
                } else {
                    AUTO_TECH_STACK.to_string()
                };
                state.answers.tech_stack = Some(stack);
            }
            AnswerKey::QualityLevel => {
                let fallback = self.options.default_quality;
                let id = questions.ask_choice(
                    &prompts::QUALITY_LEVEL,
                    QualityLevel::OPTIONS,
                    fallback.as_str(),
                )?;
                state.answers.quality_level = Some(QualityLevel::from_id(&id).unwrap_or(fallback));
            }
        }

        tracing::debug!(key = %key, "Collected answer");
        Ok(())
    }

    /// Non-interactive path: fill every missing answer with a fixed default
    /// and mark every step but the last complete, without asking anything.
    pub fn seed_quick(
        &self,
        state: &mut WorkflowState,
        project_name: &str,
    ) -> Result<(), CheckpointError> {
        if state.project_name.is_empty() {
            state.project_name = if project_name.is_empty() {
                self.options.default_project_name.clone()
            } else {
                project_name.to_string()
            };
        }

        let defaults = quick_answers(&state.project_name);
        let answers = &mut state.answers;
        answers.big_picture.get_or_insert(defaults.big_picture.unwrap_or_default());
        answers.audience = answers.audience.or(defaults.audience);
        answers.features.get_or_insert(defaults.features.unwrap_or_default());
        answers.constraints.get_or_insert_with(Vec::new);
        answers.tech_stack.get_or_insert(defaults.tech_stack.unwrap_or_default());
        answers.quality_level = answers.quality_level.or(defaults.quality_level);

        let last = StepLedger::last();
        for def in StepLedger::steps() {
            if def.id != last {
                state.mark_complete(def.id);
            }
        }
        state.current_step = Cursor::Step(last);

        self.store.save(state)?;
        tracing::info!(project = %state.project_name, "Seeded quick-mode defaults");
        Ok(())
    }

    /// Mark the final step's assistant session as in flight
    pub fn begin_build(&self, state: &mut WorkflowState) -> Result<(), CheckpointError> {
        let last = StepLedger::last();
        if state.current_step.position() != StepLedger::position(last) {
            return Err(CheckpointError::NotReady {
                step: last,
                current: state.current_step,
            });
        }

        state.current_step = Cursor::Building;
        self.store.save(state)?;
        tracing::info!("Build started");
        Ok(())
    }

    /// Record the final step as complete after its session finished
    pub fn finish_build(&self, state: &mut WorkflowState) -> Result<(), CheckpointError> {
        let last = StepLedger::last();
        match StepLedger::next_incomplete(state) {
            None => {
                if state.current_step != Cursor::Step(last) {
                    state.current_step = Cursor::Step(last);
                    self.store.save(state)?;
                }
                return Ok(());
            }
            Some(step) if step == last => {}
            Some(_) => {
                return Err(CheckpointError::NotReady {
                    step: last,
                    current: state.current_step,
                })
            }
        }

        state.mark_complete(last);
        state.current_step = Cursor::Step(last);
        self.store.save(state)?;
        tracing::info!("Build complete");
        Ok(())
    }

    /// Start over, keeping only the chosen assistant
    pub fn reset(&self, state: &mut WorkflowState) -> Result<(), CheckpointError> {
        let agent = std::mem::take(&mut state.agent);
        *state = WorkflowState {
            agent,
            ..WorkflowState::default()
        };
        self.store.save(state)?;
        Ok(())
    }

    /// Where a workflow in `state` should re-enter the ledger
    pub fn resume_point(state: &WorkflowState) -> ResumePoint {
        let Some(next) = StepLedger::next_incomplete(state) else {
            return ResumePoint::Finished;
        };

        match state.current_step {
            Cursor::Building => ResumePoint::Checkpoint(StepLedger::last()),
            Cursor::Step(step) if !state.is_complete(step) => ResumePoint::Checkpoint(step),
            Cursor::Step(_) => ResumePoint::Checkpoint(next),
        }
    }

    /// Load the stored state and work out where to re-enter
    pub fn resume(&self) -> Resumed {
        let loaded = self.store.load();
        let point = Self::resume_point(&loaded.state);
        tracing::debug!(?point, "Resuming workflow");
        Resumed {
            state: loaded.state,
            warning: loaded.warning,
            point,
        }
    }
}

/// Fixed answers used by quick mode
fn quick_answers(project_name: &str) -> Answers {
    Answers {
        big_picture: Some(format!("A {project_name} application")),
        audience: Some(Audience::Personal),
        features: Some(QUICK_FEATURES.to_string()),
        constraints: Some(Vec::new()),
        tech_stack: Some(AUTO_TECH_STACK.to_string()),
        quality_level: Some(QualityLevel::Prototype),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::ScriptedQuestions;
    use crate::state::DEFAULT_STATE_DIR;
    use tempfile::TempDir;

    fn engine(dir: &TempDir) -> CheckpointEngine {
        CheckpointEngine::new(
            StateStore::for_project(dir.path(), DEFAULT_STATE_DIR),
            EngineOptions::default(),
        )
    }

    fn named(name: &str) -> WorkflowState {
        WorkflowState {
            project_name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_constitution_collects_missing_answers() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let mut state = WorkflowState::default();
        let mut q = ScriptedQuestions::new()
            .text("project_name", "photos")
            .text("big_picture", "A photo app")
            .choice("audience", "team");

        let result = engine
            .run_checkpoint(StepId::Constitution, &mut state, &mut q)
            .unwrap();

        let Checkpoint::Ready(payload) = result else {
            panic!("expected payload");
        };
        assert_eq!(payload.project_name, "photos");
        assert_eq!(payload.command, "/speckit.constitution");
        assert_eq!(state.answers.big_picture.as_deref(), Some("A photo app"));
        assert_eq!(state.answers.audience, Some(Audience::Team));
        assert!(state.completed_steps.is_empty());
        assert_eq!(state.current_step, Cursor::Step(StepId::Spec));
        assert_eq!(
            q.asked(),
            ["project_name", "big_picture", "audience", "confirm_constitution"]
        );
    }

    #[test]
    fn test_big_picture_default_uses_project_name() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let mut state = named("photos");
        let mut q = ScriptedQuestions::new();

        engine
            .run_checkpoint(StepId::Constitution, &mut state, &mut q)
            .unwrap();
        assert_eq!(
            state.answers.big_picture.as_deref(),
            Some("A photos application")
        );
        assert_eq!(state.answers.audience, Some(Audience::Personal));
        assert_eq!(q.times_asked("project_name"), 0);
    }

    #[test]
    fn test_present_answers_are_never_asked_again() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let mut state = named("demo");
        state.answers.big_picture = Some("X".to_string());
        let mut q = ScriptedQuestions::new().text("big_picture", "overwritten");

        engine
            .run_checkpoint(StepId::Constitution, &mut state, &mut q)
            .unwrap();
        assert_eq!(q.times_asked("big_picture"), 0);
        assert_eq!(state.answers.big_picture.as_deref(), Some("X"));
    }

    #[test]
    fn test_spec_collects_constraints() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let mut state = named("demo");
        state.current_step = Cursor::Step(StepId::Spec);
        let mut q = ScriptedQuestions::new()
            .text("features", "Albums")
            .confirm("constraint_offline", true)
            .confirm("constraint_performance", true);

        engine
            .run_checkpoint(StepId::Spec, &mut state, &mut q)
            .unwrap();
        assert_eq!(state.answers.features.as_deref(), Some("Albums"));
        assert_eq!(
            state.answers.constraints,
            Some(vec![Constraint::Offline, Constraint::Performance])
        );
        assert_eq!(state.completed_steps, vec![StepId::Constitution]);
        assert_eq!(state.current_step, Cursor::Step(StepId::Plan));
    }

    #[test]
    fn test_constraints_asked_in_declared_order() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let mut state = named("demo");
        state.current_step = Cursor::Step(StepId::Spec);
        state.answers.features = Some("Albums".to_string());
        let mut q = ScriptedQuestions::new();

        engine
            .run_checkpoint(StepId::Spec, &mut state, &mut q)
            .unwrap();

        let expected: Vec<&str> = Constraint::ALL
            .iter()
            .map(|c| prompts::constraint(*c).id)
            .chain(["confirm_spec"])
            .collect();
        assert_eq!(q.asked(), expected.as_slice());
        assert_eq!(state.answers.constraints, Some(Vec::new()));
    }

    #[test]
    fn test_plan_tech_stack_only_asked_when_preferred() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let mut state = named("demo");
        state.current_step = Cursor::Step(StepId::Plan);
        state.completed_steps = vec![StepId::Constitution];
        let mut q = ScriptedQuestions::new().choice("quality_level", "prototype");

        engine
            .run_checkpoint(StepId::Plan, &mut state, &mut q)
            .unwrap();
        assert_eq!(state.answers.tech_stack.as_deref(), Some("auto"));
        assert_eq!(state.answers.quality_level, Some(QualityLevel::Prototype));
        assert_eq!(q.times_asked("tech_stack"), 0);

        let mut state = named("demo");
        state.current_step = Cursor::Step(StepId::Plan);
        state.completed_steps = vec![StepId::Constitution];
        let mut q = ScriptedQuestions::new()
            .confirm("tech_preference", true)
            .text("tech_stack", "Rust, SQLite");
        engine
            .run_checkpoint(StepId::Plan, &mut state, &mut q)
            .unwrap();
        assert_eq!(state.answers.tech_stack.as_deref(), Some("Rust, SQLite"));
        assert_eq!(state.answers.quality_level, Some(QualityLevel::Production));
    }

    #[test]
    fn test_unknown_choice_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let mut state = named("demo");
        let mut q = ScriptedQuestions::new().choice("audience", "martians");

        engine
            .run_checkpoint(StepId::Constitution, &mut state, &mut q)
            .unwrap();
        assert_eq!(state.answers.audience, Some(Audience::Personal));
    }

    #[test]
    fn test_decline_pauses_and_persists_answers() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let mut state = named("demo");
        let mut q = ScriptedQuestions::new()
            .text("big_picture", "X")
            .confirm("confirm_constitution", false);

        let result = engine
            .run_checkpoint(StepId::Constitution, &mut state, &mut q)
            .unwrap();
        assert_eq!(result, Checkpoint::Paused);
        assert_eq!(state.current_step, Cursor::Step(StepId::Constitution));

        let stored = engine.store().load().state;
        assert_eq!(stored.answers.big_picture.as_deref(), Some("X"));
        assert!(stored.completed_steps.is_empty());
    }

    #[test]
    fn test_auto_confirm_skips_confirmation() {
        let dir = TempDir::new().unwrap();
        let engine = CheckpointEngine::new(
            StateStore::for_project(dir.path(), DEFAULT_STATE_DIR),
            EngineOptions {
                auto_confirm: true,
                ..Default::default()
            },
        );
        let mut state = named("demo");
        let mut q = ScriptedQuestions::new().confirm("confirm_constitution", false);

        let result = engine
            .run_checkpoint(StepId::Constitution, &mut state, &mut q)
            .unwrap();
        assert!(matches!(result, Checkpoint::Ready(_)));
        assert_eq!(q.times_asked("confirm_constitution"), 0);
    }

    #[test]
    fn test_completed_step_is_idempotent_reentry() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let mut state = named("demo");
        state.completed_steps = vec![StepId::Constitution];
        state.current_step = Cursor::Step(StepId::Plan);
        let before = state.clone();
        let mut q = ScriptedQuestions::new();

        let result = engine
            .run_checkpoint(StepId::Constitution, &mut state, &mut q)
            .unwrap();
        assert!(matches!(result, Checkpoint::Ready(ref p) if p.step == StepId::Constitution));
        assert!(q.asked().is_empty());
        assert_eq!(state, before);
        assert!(!engine.store().exists());
    }

    #[test]
    fn test_unknown_step_name() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let mut state = WorkflowState::default();
        let mut q = ScriptedQuestions::new();

        let err = engine
            .run_named("deploy", &mut state, &mut q)
            .unwrap_err();
        assert!(matches!(err, CheckpointError::UnknownStep(_)));
        assert!(q.asked().is_empty());
    }

    #[test]
    fn test_step_ahead_of_cursor_is_not_ready() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let mut state = named("demo");
        let mut q = ScriptedQuestions::new();

        let err = engine
            .run_checkpoint(StepId::Plan, &mut state, &mut q)
            .unwrap_err();
        assert!(matches!(
            err,
            CheckpointError::NotReady {
                step: StepId::Plan,
                ..
            }
        ));
        assert!(state.completed_steps.is_empty());
    }

    #[test]
    fn test_rerunning_lagging_step_does_not_move_cursor_back() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let mut state = named("demo");
        let mut q = ScriptedQuestions::new();

        engine
            .run_checkpoint(StepId::Constitution, &mut state, &mut q)
            .unwrap();
        // Constitution is confirmed but not yet complete; running it again is allowed
        engine
            .run_checkpoint(StepId::Constitution, &mut state, &mut q)
            .unwrap();
        assert_eq!(state.current_step, Cursor::Step(StepId::Spec));
        assert!(state.completed_steps.is_empty());
        assert_eq!(q.times_asked("confirm_constitution"), 2);
        assert_eq!(q.times_asked("big_picture"), 1);
    }

    #[test]
    fn test_seed_quick_asks_nothing() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let mut state = WorkflowState::default();

        engine.seed_quick(&mut state, "p").unwrap();
        assert_eq!(state.project_name, "p");
        assert_eq!(state.answers, quick_answers("p"));
        assert_eq!(
            state.completed_steps,
            vec![
                StepId::Constitution,
                StepId::Spec,
                StepId::Plan,
                StepId::Tasks,
                StepId::Validate
            ]
        );
        assert_eq!(state.current_step, Cursor::Step(StepId::Build));
        assert_eq!(engine.store().load().state, state);
    }

    #[test]
    fn test_seed_quick_keeps_existing_answers() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let mut state = named("demo");
        state.answers.features = Some("Albums".to_string());

        engine.seed_quick(&mut state, "ignored").unwrap();
        assert_eq!(state.project_name, "demo");
        assert_eq!(state.answers.features.as_deref(), Some("Albums"));
        assert_eq!(state.answers.tech_stack.as_deref(), Some("auto"));
    }

    #[test]
    fn test_build_markers() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let mut state = WorkflowState::default();

        assert!(engine.begin_build(&mut state).is_err());
        assert!(engine.finish_build(&mut state).is_err());

        engine.seed_quick(&mut state, "p").unwrap();
        engine.begin_build(&mut state).unwrap();
        assert_eq!(state.current_step, Cursor::Building);
        assert_eq!(
            CheckpointEngine::resume_point(&state),
            ResumePoint::Checkpoint(StepId::Build)
        );

        engine.finish_build(&mut state).unwrap();
        assert!(state.is_complete(StepId::Build));
        assert_eq!(CheckpointEngine::resume_point(&state), ResumePoint::Finished);
        // Second call is a no-op
        engine.finish_build(&mut state).unwrap();
        assert_eq!(state.completed_steps.len(), 6);
    }

    #[test]
    fn test_finish_build_clears_stale_building_marker() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let mut state = WorkflowState::default();
        engine.seed_quick(&mut state, "p").unwrap();
        state.mark_complete(StepId::Build);
        state.current_step = Cursor::Building;

        engine.finish_build(&mut state).unwrap();
        assert_eq!(state.current_step, Cursor::Step(StepId::Build));
        assert_eq!(
            engine.store().load().state.current_step,
            Cursor::Step(StepId::Build)
        );
    }

    #[test]
    fn test_build_checkpoint_runs_while_building() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let mut state = WorkflowState::default();
        engine.seed_quick(&mut state, "p").unwrap();
        engine.begin_build(&mut state).unwrap();

        let mut q = ScriptedQuestions::new();
        let result = engine
            .run_checkpoint(StepId::Build, &mut state, &mut q)
            .unwrap();
        assert!(matches!(result, Checkpoint::Ready(ref p) if p.is_build()));
        assert_eq!(state.current_step, Cursor::Step(StepId::Build));
        assert_eq!(state.completed_steps.len(), 5);
    }

    #[test]
    fn test_reset_keeps_agent() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let mut state = named("demo");
        state.agent = "opencode".to_string();
        state.completed_steps = vec![StepId::Constitution];

        engine.reset(&mut state).unwrap();
        assert_eq!(state.agent, "opencode");
        assert_eq!(state.project_name, "");
        assert!(state.completed_steps.is_empty());
    }

    #[test]
    fn test_resume_reads_store() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);

        let resumed = engine.resume();
        assert_eq!(resumed.point, ResumePoint::Checkpoint(StepId::Constitution));
        assert!(resumed.warning.is_none());

        let mut state = named("demo");
        state.current_step = Cursor::Step(StepId::Tasks);
        state.completed_steps = vec![StepId::Constitution, StepId::Spec];
        engine.store().save(&state).unwrap();

        let resumed = engine.resume();
        assert_eq!(resumed.point, ResumePoint::Checkpoint(StepId::Tasks));
        assert_eq!(resumed.state, state);
    }
}
