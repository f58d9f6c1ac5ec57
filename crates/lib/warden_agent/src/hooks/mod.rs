// @zen-component: AGENT-HookPipeline
//
//! Hook/middleware pipeline for agent tool calls.
//!
//! Provides a trait-based hook system that runs before and after every tool
//! call. Hooks can inspect, transform, or reject calls. Built-in hooks
//! provide guardrails and audit logging.

pub mod audit;
pub mod guardrail;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use warden_core::audit::ActionLog;
use warden_core::guardrail::Guardrail;

/// Context passed to hooks for each tool call.
#[derive(Debug, Clone)]
pub struct HookContext {
    pub session_id: String,
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
    pub tool_name: String,
    /// Parameters as the tool received them. Filled in by [`crate::run_tool`].
    pub input: serde_json::Value,
    pub started_at: Instant,
}

impl HookContext {
    pub fn new(session_id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: None,
            ip_address: None,
            tool_name: tool_name.into(),
            input: serde_json::Value::Null,
            started_at: Instant::now(),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_ip(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }
}

/// Scope at which a hook applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookScope {
    Global,
    Session(String),
    User(String),
    Tool(String),
}

/// Outcome of a tool call, passed to after_call hooks.
#[derive(Debug, Clone)]
pub enum ToolCallOutcome {
    Success(serde_json::Value),
    Error(String),
}

impl ToolCallOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolCallOutcome::Success(_))
    }
}

/// Errors that can occur in hooks.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("Blocked: {0}")]
    Blocked(String),

    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Tool failed: {0}")]
    ToolFailed(String),

    #[error("Hook error: {0}")]
    Internal(String),
}

/// Hook trait: implement for custom hook logic.
///
/// Hooks form an ordered pipeline. `before_call` runs in order; `after_call`
/// runs in reverse order (onion model).
#[async_trait]
pub trait ToolHook: Send + Sync {
    /// Called before tool execution. Return Err to reject the call.
    async fn before_call(
        &self,
        ctx: &HookContext,
        params: &mut serde_json::Value,
    ) -> Result<(), HookError>;

    /// Called after tool execution. Can inspect or transform the outcome.
    async fn after_call(
        &self,
        ctx: &HookContext,
        outcome: &mut ToolCallOutcome,
    ) -> Result<(), HookError>;

    /// Hook identifier for debugging/logging.
    fn name(&self) -> &str;
}

/// Ordered pipeline of hooks.
///
/// `run_before` executes hooks in order, short-circuiting on error.
/// `run_after` executes hooks in reverse order (onion model).
pub struct HookPipeline {
    hooks: Vec<(HookScope, Arc<dyn ToolHook>)>,
}

impl HookPipeline {
    /// Create a new pipeline from an ordered list of scoped hooks.
    pub fn new(hooks: Vec<(HookScope, Arc<dyn ToolHook>)>) -> Self {
        Self { hooks }
    }

    /// Create an empty pipeline (no-op).
    pub fn empty() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Append a hook; it runs last before the call and first after it.
    pub fn push(&mut self, scope: HookScope, hook: Arc<dyn ToolHook>) {
        self.hooks.push((scope, hook));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run all before_call hooks in order. Short-circuits on error.
    pub async fn run_before(
        &self,
        ctx: &HookContext,
        params: &mut serde_json::Value,
    ) -> Result<(), HookError> {
        for (scope, hook) in &self.hooks {
            if scope_matches(scope, ctx) {
                if let Err(e) = hook.before_call(ctx, params).await {
                    tracing::debug!(hook = hook.name(), tool = %ctx.tool_name, error = %e, "hook rejected call");
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Run all after_call hooks in reverse order.
    pub async fn run_after(
        &self,
        ctx: &HookContext,
        outcome: &mut ToolCallOutcome,
    ) -> Result<(), HookError> {
        for (scope, hook) in self.hooks.iter().rev() {
            if scope_matches(scope, ctx) {
                hook.after_call(ctx, outcome).await?;
            }
        }
        Ok(())
    }
}

/// Check whether a hook scope matches the given context.
fn scope_matches(scope: &HookScope, ctx: &HookContext) -> bool {
    match scope {
        HookScope::Global => true,
        HookScope::Session(sid) => ctx.session_id == *sid,
        HookScope::User(uid) => ctx.user_id.as_deref() == Some(uid.as_str()),
        HookScope::Tool(name) => ctx.tool_name == *name,
    }
}

/// Build the default hook pipeline with built-in hooks.
///
/// Pipeline order: AuditHook → GuardrailHook. Audit is outermost so its
/// `after_call` sees the outcome the guardrail has already filtered.
pub fn default_pipeline(guardrail: Arc<Guardrail>, actions: ActionLog) -> HookPipeline {
    HookPipeline::new(vec![
        (HookScope::Global, Arc::new(audit::AuditHook::new(actions))),
        (
            HookScope::Global,
            Arc::new(guardrail::GuardrailHook::new(guardrail)),
        ),
    ])
}
