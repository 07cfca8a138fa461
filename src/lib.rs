//! here-spec - progressive checkpoints for Spec-Driven Development
//!
//! The library exposes the checkpoint state machine (state store, step
//! ledger, checkpoint engine, context assembly) together with the
//! collaborators the CLI wires into it.

pub mod agents;
pub mod config;
pub mod llm;
pub mod logging;
pub mod projects;
pub mod questions;
pub mod state;
pub mod steps;
pub mod workflow;
