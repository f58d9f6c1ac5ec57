// @zen-component: AGENT-Preflight
//
//! Agent-path service: pre-flight checks for tool calls and action reporting.
//!
//! Rejections are normal outcomes (`allowed: false`), not errors. Every
//! rejected attempt is written to the action log with its reason.

use warden_core::audit::ActionLog;
use warden_core::guardrail::{DEFAULT_MAX_SENSITIVE_OPS, DEFAULT_WINDOW, Guardrail};
use warden_core::models::agent::{AgentAction, NewAgentAction};

use crate::models::{PreflightRequest, PreflightResponse};

/// Caller identity attached to recorded actions.
#[derive(Debug, Clone, Default)]
pub struct Caller {
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
}

fn record_rejection(actions: &ActionLog, req: &PreflightRequest, caller: &Caller, reason: &str) {
    actions.log_action(NewAgentAction {
        session_id: req.session_id.clone(),
        tool_name: req.tool_name.clone(),
        input: req.input.clone(),
        output: serde_json::Value::Null,
        success: false,
        duration_ms: 0,
        user_id: caller.user_id.clone(),
        ip_address: caller.ip_address.clone(),
        error: Some(reason.to_string()),
    });
}

/// Run the guardrail, confirmation and rate-limit checks for a tool call.
pub fn preflight(
    guardrail: &Guardrail,
    actions: &ActionLog,
    req: &PreflightRequest,
    caller: &Caller,
) -> PreflightResponse {
    let validation = req.prompt.as_deref().map(|p| guardrail.validate_input(p));

    if let Some(result) = validation.as_ref().filter(|r| !r.is_valid) {
        let reason = result
            .reason
            .clone()
            .unwrap_or_else(|| "Input rejected".into());
        record_rejection(actions, req, caller, &reason);
        return PreflightResponse {
            allowed: false,
            requires_confirmation: false,
            validation,
            rate_limit: None,
            reason: Some(reason),
        };
    }

    let requires_confirmation = guardrail.requires_confirmation(&req.tool_name, &req.input);
    let rate_limit = requires_confirmation.then(|| {
        guardrail.check_sensitive_rate_limit(
            &req.session_id,
            &req.tool_name,
            DEFAULT_MAX_SENSITIVE_OPS,
            DEFAULT_WINDOW,
        )
    });

    if rate_limit.is_some_and(|d| !d.allowed) {
        let reason = "Too many sensitive operations, try again later";
        record_rejection(actions, req, caller, reason);
        return PreflightResponse {
            allowed: false,
            requires_confirmation,
            validation,
            rate_limit,
            reason: Some(reason.to_string()),
        };
    }

    PreflightResponse {
        allowed: true,
        requires_confirmation,
        validation,
        rate_limit,
        reason: None,
    }
}

/// Record an action reported by the agent runtime, stamping the caller.
pub fn record_action(actions: &ActionLog, mut action: NewAgentAction, caller: &Caller) -> AgentAction {
    // The authenticated identity wins over whatever the body claims.
    action.user_id = caller.user_id.clone().or(action.user_id);
    action.ip_address = caller.ip_address.clone().or(action.ip_address);
    actions.log_action(action)
}
