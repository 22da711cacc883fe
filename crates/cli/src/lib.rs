//! Interview Analyzer CLI
//!
//! Terminal front end: runs an analysis session against the local
//! orchestrator or a remote API server and renders progress and feedback.

pub mod commands;
pub mod remote;
pub mod render;
