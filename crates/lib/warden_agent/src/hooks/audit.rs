// @zen-component: AGENT-AuditHook
//
//! Audit hook: writes every tool call to the action log.
//!
//! Always first in the pipeline, so its `after_call` runs last and records
//! the final outcome, including calls another hook rejected.

use async_trait::async_trait;
use tracing::debug;
use warden_core::audit::ActionLog;
use warden_core::models::agent::NewAgentAction;

use super::{HookContext, HookError, ToolCallOutcome, ToolHook};

/// Audit hook: records every tool call in the action log.
pub struct AuditHook {
    actions: ActionLog,
}

impl AuditHook {
    pub fn new(actions: ActionLog) -> Self {
        Self { actions }
    }
}

#[async_trait]
impl ToolHook for AuditHook {
    async fn before_call(
        &self,
        _ctx: &HookContext,
        _params: &mut serde_json::Value,
    ) -> Result<(), HookError> {
        // Audit runs after the call, not before.
        Ok(())
    }

    async fn after_call(
        &self,
        ctx: &HookContext,
        outcome: &mut ToolCallOutcome,
    ) -> Result<(), HookError> {
        let (output, error) = match outcome {
            ToolCallOutcome::Success(value) => (value.clone(), None),
            ToolCallOutcome::Error(message) => (serde_json::Value::Null, Some(message.clone())),
        };
        let duration_ms = u64::try_from(ctx.started_at.elapsed().as_millis()).unwrap_or(u64::MAX);

        let action = self.actions.log_action(NewAgentAction {
            session_id: ctx.session_id.clone(),
            tool_name: ctx.tool_name.clone(),
            input: ctx.input.clone(),
            output,
            success: outcome.is_success(),
            duration_ms,
            user_id: ctx.user_id.clone(),
            ip_address: ctx.ip_address.clone(),
            error,
        });
        debug!(action_id = %action.id, tool = %ctx.tool_name, success = action.success, "tool call audited");

        Ok(())
    }

    fn name(&self) -> &str {
        "AuditHook"
    }
}
