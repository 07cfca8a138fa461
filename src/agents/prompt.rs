//! Handlebars rendering of the documents handed to an assistant
//!
//! - step context: `context-<step>.md` for every step but build
//! - build context: `launcher-context.md` for the build step
//! - interview command: the assistant's `interview-context` slash command

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde_json::{json, Value};

use crate::state::STATE_FILE;
use crate::steps::{ContextPayload, StepLedger};

const STEP_TEMPLATE: &str = "step_context";
const BUILD_TEMPLATE: &str = "build_context";
const COMMAND_TEMPLATE: &str = "interview_command";

const NOT_ANSWERED: &str = "N/A";

/// Renders context documents from a [`ContextPayload`]
pub struct ContextRenderer {
    handlebars: Handlebars<'static>,
    state_dir: String,
}

impl ContextRenderer {
    pub fn new(state_dir: &str) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        // Plain markdown, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(false);

        handlebars
            .register_template_string(STEP_TEMPLATE, include_str!("templates/step_context.md.hbs"))
            .context("Failed to register step context template")?;
        handlebars
            .register_template_string(
                BUILD_TEMPLATE,
                include_str!("templates/build_context.md.hbs"),
            )
            .context("Failed to register build context template")?;
        handlebars
            .register_template_string(
                COMMAND_TEMPLATE,
                include_str!("templates/interview_command.md.hbs"),
            )
            .context("Failed to register interview command template")?;

        Ok(Self {
            handlebars,
            state_dir: state_dir.to_string(),
        })
    }

    /// Template data with every unanswered key filled with a placeholder
    pub fn data(&self, payload: &ContextPayload) -> Value {
        let answers = &payload.answers;
        let project_name = if payload.project_name.is_empty() {
            "Unnamed"
        } else {
            payload.project_name.as_str()
        };
        let completed = if payload.completed_steps.is_empty() {
            "None".to_string()
        } else {
            payload
                .completed_steps
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let audience = answers.audience.map_or(NOT_ANSWERED, |a| a.as_str());

        json!({
            "project_name": project_name,
            "step": payload.step.as_str(),
            "step_title": StepLedger::label(payload.step),
            "command": payload.command,
            "description": answers.big_picture.as_deref().unwrap_or(NOT_ANSWERED),
            "audience": audience,
            "features": answers.features.as_deref().unwrap_or(NOT_ANSWERED),
            "constraints": answers.constraints_display(),
            "tech_stack": answers.tech_stack.as_deref().unwrap_or("auto"),
            "quality_level": answers.quality_level.unwrap_or_default().as_str(),
            "completed_steps": completed,
            "state_file": format!("{}/{}", self.state_dir, STATE_FILE),
        })
    }

    /// Context document for the payload's step
    pub fn render_context(&self, payload: &ContextPayload) -> Result<String> {
        let template = if payload.is_build() {
            BUILD_TEMPLATE
        } else {
            STEP_TEMPLATE
        };
        self.render(template, payload)
    }

    pub fn render_command(&self, payload: &ContextPayload) -> Result<String> {
        self.render(COMMAND_TEMPLATE, payload)
    }

    fn render(&self, template: &str, payload: &ContextPayload) -> Result<String> {
        self.handlebars
            .render(template, &self.data(payload))
            .with_context(|| format!("Failed to render {template} template"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{WorkflowState, DEFAULT_STATE_DIR};
    use crate::steps::{Audience, Constraint, ContextAssembler, StepId};

    fn payload(step: StepId) -> ContextPayload {
        let mut state = WorkflowState {
            project_name: "photos".to_string(),
            completed_steps: vec![StepId::Constitution, StepId::Spec],
            ..Default::default()
        };
        state.answers.big_picture = Some("Share <family> photos & albums".to_string());
        state.answers.audience = Some(Audience::Team);
        state.answers.constraints = Some(vec![Constraint::Offline, Constraint::Mobile]);
        ContextAssembler::assemble(&state, step)
    }

    #[test]
    fn test_step_context_uses_answers() {
        let renderer = ContextRenderer::new(DEFAULT_STATE_DIR).unwrap();
        let doc = renderer.render_context(&payload(StepId::Plan)).unwrap();

        assert!(doc.starts_with("# Step: Technical Approach"));
        assert!(doc.contains("**Command**: /speckit.plan"));
        assert!(doc.contains("**Audience**: team"));
        // Unanswered keys get placeholders
        assert!(doc.contains("**Features**: N/A"));
        assert!(doc.contains("**Quality**: production"));
    }

    #[test]
    fn test_no_html_escaping() {
        let renderer = ContextRenderer::new(DEFAULT_STATE_DIR).unwrap();
        let doc = renderer.render_context(&payload(StepId::Spec)).unwrap();
        assert!(doc.contains("Share <family> photos & albums"));
    }

    #[test]
    fn test_build_context_lists_constraints_and_steps() {
        let renderer = ContextRenderer::new(DEFAULT_STATE_DIR).unwrap();
        let doc = renderer.render_context(&payload(StepId::Build)).unwrap();

        assert!(doc.starts_with("# Build Context"));
        assert!(doc.contains("**Completed Steps**: constitution, spec"));
        assert!(doc.contains("**Constraints**: offline, mobile"));
        assert!(doc.contains("**Tech Stack**: auto"));
        assert!(doc.contains("Run: /speckit.implement"));
    }

    #[test]
    fn test_interview_command_points_at_state_file() {
        let renderer = ContextRenderer::new(".work").unwrap();
        let doc = renderer.render_command(&payload(StepId::Tasks)).unwrap();

        assert!(doc.starts_with("---\ndescription: Show project context\n---"));
        assert!(doc.contains("Name: photos"));
        assert!(doc.contains("Step: tasks"));
        assert!(doc.contains("Full context in .work/checkpoints.json"));
    }
}
