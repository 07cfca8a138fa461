//! Interactive workflow driver.
//!
//! Strings checkpoints and assistant launches together for the CLI:
//! resume, run the checkpoint at the cursor, launch, ask to continue.
//! All console output goes through the writer handed to [`Workflow::new`].

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;

use crate::agents::{Assistant, AssistantLauncher, LaunchOutcome, LaunchReport};
use crate::questions::{Question, QuestionSource};
use crate::state::{Cursor, LoadWarning, WorkflowState};
use crate::steps::{
    Checkpoint, CheckpointEngine, ContextPayload, ResumePoint, StepId, StepLedger,
};

const CONTINUE_NEXT: Question = Question::new("continue_next", "Continue to next step?");

/// How a workflow run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// A checkpoint confirmation was declined
    Paused(StepId),
    /// The user stopped after this step's assistant session
    Stopped(StepId),
    /// The build session was handed off; `Launched` means it completed
    Built(LaunchOutcome),
    /// Every step was already complete
    Finished,
}

/// Drives one project through its checkpoints
pub struct Workflow<'a> {
    project_dir: PathBuf,
    engine: CheckpointEngine,
    questions: &'a mut dyn QuestionSource,
    launcher: &'a dyn AssistantLauncher,
    out: &'a mut dyn Write,
    celebrations: bool,
}

impl<'a> Workflow<'a> {
    pub fn new(
        project_dir: impl Into<PathBuf>,
        engine: CheckpointEngine,
        questions: &'a mut dyn QuestionSource,
        launcher: &'a dyn AssistantLauncher,
        out: &'a mut dyn Write,
    ) -> Self {
        Self {
            project_dir: project_dir.into(),
            engine,
            questions,
            launcher,
            out,
            celebrations: true,
        }
    }

    pub fn with_celebrations(mut self, celebrations: bool) -> Self {
        self.celebrations = celebrations;
        self
    }

    fn project_label(&self) -> String {
        self.project_dir
            .file_name()
            .map_or_else(|| ".".to_string(), |n| n.to_string_lossy().to_string())
    }

    /// Load stored state, reporting a discarded document
    pub fn load_state(&mut self) -> Result<WorkflowState> {
        let loaded = self.engine.store().load();
        if let Some(warning) = &loaded.warning {
            self.print_load_warning(warning)?;
        }
        Ok(loaded.state)
    }

    fn print_load_warning(&mut self, warning: &LoadWarning) -> Result<()> {
        writeln!(self.out, "⚠️  {warning}")?;
        writeln!(self.out, "   Starting from a fresh checkpoint state.")?;
        Ok(())
    }

    /// `init`: start fresh unless answers were already given, record the
    /// assistant, then run the quick or the progressive flow.
    pub fn init(
        &mut self,
        project_name: &str,
        assistant: Assistant,
        quick: bool,
    ) -> Result<FlowOutcome> {
        let mut state = self.load_state()?;

        if state.answers.is_empty() {
            writeln!(self.out, "Starting fresh project...")?;
            state = WorkflowState::default();
        } else {
            writeln!(self.out, "Resuming existing project...")?;
        }

        if state.project_name.is_empty() {
            state.project_name = project_name.to_string();
        }
        state.agent = assistant.as_str().to_string();
        self.engine.store().save(&state)?;
        tracing::info!(project = %state.project_name, agent = %state.agent, quick, "Initialized project");

        if quick {
            self.run_quick(&mut state)
        } else {
            self.run_progressive(&mut state)
        }
    }

    /// Seed defaults and go straight to the build step
    pub fn run_quick(&mut self, state: &mut WorkflowState) -> Result<FlowOutcome> {
        let name = state.project_name.clone();
        self.engine.seed_quick(state, &name)?;
        writeln!(self.out, "⚡ Quick mode: using defaults for every step")?;
        self.run_build(state)
    }

    /// `continue`: show where the project stands and resume
    pub fn resume(&mut self) -> Result<FlowOutcome> {
        let resumed = self.engine.resume();
        if let Some(warning) = &resumed.warning {
            self.print_load_warning(warning)?;
        }
        let mut state = resumed.state;

        let name = if state.project_name.is_empty() {
            self.project_label()
        } else {
            state.project_name.clone()
        };
        let completed = if state.completed_steps.is_empty() {
            "None".to_string()
        } else {
            state
                .completed_steps
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };

        writeln!(self.out, "🐕 Resuming: {name}")?;
        writeln!(self.out, "Current step: {}", state.current_step)?;
        writeln!(self.out, "Completed: {completed}")?;

        if state.current_step == Cursor::Building {
            writeln!(self.out, "\nBuild was in progress. Restarting build step...")?;
        }

        self.run_progressive(&mut state)
    }

    /// Run checkpoints from the cursor until paused, stopped or built
    pub fn run_progressive(&mut self, state: &mut WorkflowState) -> Result<FlowOutcome> {
        loop {
            let step = match CheckpointEngine::resume_point(state) {
                ResumePoint::Finished => {
                    self.print_finished()?;
                    return Ok(FlowOutcome::Finished);
                }
                ResumePoint::Checkpoint(step) => step,
            };

            if step == StepLedger::last() {
                return self.run_build(state);
            }

            let payload = match self
                .engine
                .run_checkpoint(step, state, &mut *self.questions)?
            {
                Checkpoint::Paused => {
                    self.print_paused(&format!("Paused at {step} step"))?;
                    return Ok(FlowOutcome::Paused(step));
                }
                Checkpoint::Ready(payload) => payload,
            };

            let report = self.launch(&payload)?;
            if report.outcome == LaunchOutcome::Launched {
                self.celebrate(Some(step))?;
            }

            if !self.questions.ask_confirm(&CONTINUE_NEXT, true)? {
                self.print_paused(&format!("Paused after {step}"))?;
                return Ok(FlowOutcome::Stopped(step));
            }
        }
    }

    /// Build checkpoint, then hand the project to the assistant
    pub fn run_build(&mut self, state: &mut WorkflowState) -> Result<FlowOutcome> {
        let build = StepLedger::last();
        if state.is_complete(build) {
            self.engine.finish_build(state)?;
            self.print_finished()?;
            return Ok(FlowOutcome::Finished);
        }

        let payload = match self
            .engine
            .run_checkpoint(build, state, &mut *self.questions)?
        {
            Checkpoint::Paused => {
                self.print_paused("Build paused")?;
                return Ok(FlowOutcome::Paused(build));
            }
            Checkpoint::Ready(payload) => payload,
        };

        self.engine.begin_build(state)?;
        writeln!(self.out, "\n🏗️  Starting Implementation\n")?;

        let report = self.launch(&payload)?;
        match report.outcome {
            LaunchOutcome::Launched => {
                self.engine.finish_build(state)?;
                self.celebrate(None)?;
            }
            LaunchOutcome::Ended => {
                writeln!(self.out, "Run 'here-spec continue' to resume")?;
            }
            LaunchOutcome::NotInstalled | LaunchOutcome::Manual => {}
        }

        Ok(FlowOutcome::Built(report.outcome))
    }

    /// `step <name>`: run exactly that checkpoint, without launching.
    /// `agent` replaces the recorded assistant first.
    pub fn run_step(&mut self, name: &str, agent: Option<Assistant>) -> Result<Checkpoint> {
        let mut state = self.load_state()?;
        if let Some(agent) = agent {
            state.agent = agent.as_str().to_string();
            self.engine.store().save(&state)?;
        }
        let result = self
            .engine
            .run_named(name, &mut state, &mut *self.questions)?;

        match &result {
            Checkpoint::Ready(_) => {
                writeln!(self.out, "\n✅ Step '{name}' interview complete!")?;
                writeln!(
                    self.out,
                    "Next: Run 'here-spec continue' or run the Spec Kit command yourself"
                )?;
            }
            Checkpoint::Paused => {
                writeln!(self.out, "\n⏸️  Step '{name}' paused")?;
            }
        }
        Ok(result)
    }

    fn launch(&mut self, payload: &ContextPayload) -> Result<LaunchReport> {
        writeln!(self.out, "\n🚀 Running {}...", payload.command)?;

        let report = self.launcher.launch(payload, &self.project_dir)?;
        let name = report.assistant.display_name();
        writeln!(self.out, "Context saved to {}", report.context_file.display())?;
        writeln!(
            self.out,
            "Created assistant command: {}",
            report.command_file.display()
        )?;

        match report.outcome {
            LaunchOutcome::Launched => {}
            LaunchOutcome::Ended => {
                writeln!(self.out, "\n👋 {name} session ended")?;
            }
            LaunchOutcome::NotInstalled => {
                writeln!(self.out, "❌ {name} not found!")?;
                for line in report.assistant.install_hint() {
                    writeln!(self.out, "Install: {line}")?;
                }
            }
            LaunchOutcome::Manual => {
                let project = self.project_label();
                writeln!(self.out, "\n⚠️  Non-interactive mode")?;
                writeln!(self.out, "To run this step manually:")?;
                writeln!(self.out, "  cd {project}")?;
                writeln!(self.out, "  {}", report.assistant.binary())?;
                writeln!(self.out, "Then run: {}", payload.command)?;
            }
        }

        Ok(report)
    }

    fn print_finished(&mut self) -> Result<()> {
        let project = self.project_label();
        let location = self.project_dir.display().to_string();
        writeln!(self.out, "\n✅ All steps completed for {project}!")?;
        writeln!(self.out, "Your project is ready at:")?;
        writeln!(self.out, "  {location}")?;
        Ok(())
    }

    fn print_paused(&mut self, headline: &str) -> Result<()> {
        let project = self.project_label();
        writeln!(self.out, "\n⏸️  {headline}")?;
        writeln!(self.out, "\nProject: {project}")?;
        writeln!(self.out, "\nTo resume:")?;
        writeln!(self.out, "  cd {project}")?;
        writeln!(self.out, "  here-spec continue")?;
        Ok(())
    }

    /// Milestone line for a finished step; `None` is the whole project
    fn celebrate(&mut self, step: Option<StepId>) -> Result<()> {
        if !self.celebrations {
            return Ok(());
        }

        let line = match step {
            Some(StepId::Constitution) => "🎉 Constitution Created!",
            Some(StepId::Spec) => "🎉 Specification Complete!",
            Some(StepId::Plan) => "🎉 Plan Ready!",
            Some(StepId::Tasks) => "🎉 Tasks Ready!",
            Some(StepId::Validate) => "🎉 Validation Done!",
            Some(StepId::Build) | None => {
                writeln!(self.out, "\n🏆 Project Complete! (★‿★)🐕🎉")?;
                writeln!(self.out, "Spec is SO proud of you!")?;
                return Ok(());
            }
        };
        writeln!(self.out, "\n{line} (◕‿◕)🐕")?;
        Ok(())
    }
}

/// Progress listing used by `status`
pub fn render_status(state: &WorkflowState, out: &mut dyn Write) -> std::io::Result<()> {
    let name = if state.project_name.is_empty() {
        "(unnamed)"
    } else {
        state.project_name.as_str()
    };
    writeln!(out, "Project: {name}")?;
    writeln!(out, "\nProgress:")?;

    let current = match state.current_step {
        Cursor::Step(step) => step,
        Cursor::Building => StepLedger::last(),
    };
    for def in StepLedger::steps() {
        if state.is_complete(def.id) {
            writeln!(out, "  ✅ {}", def.id)?;
        } else if def.id == current {
            writeln!(out, "  ⏳ {} (current)", def.id)?;
        } else {
            writeln!(out, "  ⬜ {}", def.id)?;
        }
    }

    writeln!(out, "\nAgent: {}", state.agent)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::agents::MockLauncher;
    use crate::questions::ScriptedQuestions;
    use crate::state::{StateStore, DEFAULT_STATE_DIR};
    use crate::steps::EngineOptions;
    use tempfile::TempDir;

    fn engine(dir: &TempDir) -> CheckpointEngine {
        CheckpointEngine::new(
            StateStore::for_project(dir.path(), DEFAULT_STATE_DIR),
            EngineOptions::default(),
        )
    }

    #[test]
    fn test_status_markers() {
        let state = WorkflowState {
            project_name: "demo".to_string(),
            current_step: Cursor::Step(StepId::Plan),
            completed_steps: vec![StepId::Constitution],
            ..Default::default()
        };
        let mut out = Vec::new();
        render_status(&state, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Project: demo"));
        assert!(text.contains("  ✅ constitution"));
        assert!(text.contains("  ⬜ spec"));
        assert!(text.contains("  ⏳ plan (current)"));
        assert!(text.contains("  ⬜ build"));
        assert!(text.contains("Agent: claude"));
    }

    #[test]
    fn test_status_while_building() {
        let state = WorkflowState {
            current_step: Cursor::Building,
            ..Default::default()
        };
        let mut out = Vec::new();
        render_status(&state, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("⏳ build (current)"));
    }

    #[test]
    fn test_progressive_stops_when_user_declines_to_continue() {
        let dir = TempDir::new().unwrap();
        let launcher = MockLauncher::default();
        let mut questions = ScriptedQuestions::new().confirm("continue_next", false);
        let mut out = Vec::new();

        let mut state = WorkflowState {
            project_name: "demo".to_string(),
            ..Default::default()
        };
        let outcome = Workflow::new(
            dir.path(),
            engine(&dir),
            &mut questions,
            &launcher,
            &mut out,
        )
        .run_progressive(&mut state)
        .unwrap();

        assert_eq!(outcome, FlowOutcome::Stopped(StepId::Constitution));
        assert_eq!(launcher.launched_steps(), vec![StepId::Constitution]);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("🚀 Running /speckit.constitution..."));
        assert!(text.contains("🎉 Constitution Created!"));
        assert!(text.contains("here-spec continue"));
    }

    #[test]
    fn test_celebrations_can_be_disabled() {
        let dir = TempDir::new().unwrap();
        let launcher = MockLauncher::default();
        let mut questions = ScriptedQuestions::new().confirm("continue_next", false);
        let mut out = Vec::new();

        let mut state = WorkflowState::default();
        Workflow::new(
            dir.path(),
            engine(&dir),
            &mut questions,
            &launcher,
            &mut out,
        )
        .with_celebrations(false)
        .run_progressive(&mut state)
        .unwrap();

        assert!(!String::from_utf8(out).unwrap().contains("🎉"));
    }

    #[test]
    fn test_manual_launch_prints_instructions() {
        let dir = TempDir::new().unwrap();
        let launcher = MockLauncher::new(LaunchOutcome::Manual);
        let mut questions = ScriptedQuestions::new().confirm("continue_next", false);
        let mut out = Vec::new();

        let mut state = WorkflowState::default();
        Workflow::new(
            dir.path(),
            engine(&dir),
            &mut questions,
            &launcher,
            &mut out,
        )
        .run_progressive(&mut state)
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Non-interactive mode"));
        assert!(text.contains("Then run: /speckit.constitution"));
        assert!(!text.contains("🎉"));
    }

    #[test]
    fn test_missing_assistant_prints_install_hint() {
        let dir = TempDir::new().unwrap();
        let launcher = MockLauncher::new(LaunchOutcome::NotInstalled);
        let mut questions = ScriptedQuestions::new();
        let mut out = Vec::new();

        let mut state = WorkflowState::default();
        let engine = engine(&dir);
        engine.seed_quick(&mut state, "demo").unwrap();

        let outcome = Workflow::new(dir.path(), engine, &mut questions, &launcher, &mut out)
            .run_build(&mut state)
            .unwrap();

        assert_eq!(outcome, FlowOutcome::Built(LaunchOutcome::NotInstalled));
        assert_eq!(state.current_step, Cursor::Building);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("npm install -g @anthropic-ai/claude-code"));
    }

    #[test]
    fn test_run_step_does_not_launch() {
        let dir = TempDir::new().unwrap();
        let launcher = MockLauncher::default();
        let mut questions = ScriptedQuestions::new().text("project_name", "demo");
        let mut out = Vec::new();

        let result = Workflow::new(
            dir.path(),
            engine(&dir),
            &mut questions,
            &launcher,
            &mut out,
        )
        .run_step("constitution", None)
        .unwrap();

        assert!(matches!(result, Checkpoint::Ready(_)));
        assert!(launcher.launched_steps().is_empty());
        assert!(String::from_utf8(out)
            .unwrap()
            .contains("Step 'constitution' interview complete!"));
    }

    #[test]
    fn test_run_step_agent_override_keeps_load_warning() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        fs::create_dir_all(engine.store().dir()).unwrap();
        fs::write(engine.store().path(), "not-json").unwrap();

        let launcher = MockLauncher::default();
        let mut questions = ScriptedQuestions::new().confirm("confirm_constitution", false);
        let mut out = Vec::new();
        Workflow::new(dir.path(), engine, &mut questions, &launcher, &mut out)
            .run_step("constitution", Some(Assistant::Opencode))
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("⚠️"));
        assert!(text.contains("Starting from a fresh checkpoint state."));
        let stored = StateStore::for_project(dir.path(), DEFAULT_STATE_DIR).load();
        assert!(stored.warning.is_none());
        assert_eq!(stored.state.agent, "opencode");
    }

    #[test]
    fn test_resume_reports_discarded_state() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        fs::create_dir_all(engine.store().dir()).unwrap();
        fs::write(engine.store().path(), r#"{"version": 999}"#).unwrap();

        let launcher = MockLauncher::default();
        let mut questions = ScriptedQuestions::new().confirm("confirm_constitution", false);
        let mut out = Vec::new();
        let outcome = Workflow::new(dir.path(), engine, &mut questions, &launcher, &mut out)
            .resume()
            .unwrap();

        assert_eq!(outcome, FlowOutcome::Paused(StepId::Constitution));
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("checkpoint format changed"));
        assert!(text.contains("Current step: constitution"));
    }
}
