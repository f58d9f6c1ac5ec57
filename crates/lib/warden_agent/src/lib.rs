//! # warden_agent
//!
//! Hook pipeline wrapped around agent tool calls. The default pipeline
//! validates and sanitises parameters, enforces confirmation and the
//! sensitive-operation rate limit, filters tool output and writes every
//! attempt to the action log.

pub mod hooks;
pub mod runner;

pub use hooks::{HookContext, HookError, HookPipeline, HookScope, ToolCallOutcome, ToolHook};
pub use runner::run_tool;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
