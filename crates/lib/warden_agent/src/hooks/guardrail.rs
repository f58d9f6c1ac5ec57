// @zen-component: AGENT-GuardrailHook
//
//! Guardrail hook: validates and sanitises tool parameters, enforces
//! confirmation and the sensitive-operation rate limit, and filters output.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use warden_core::guardrail::{DEFAULT_MAX_SENSITIVE_OPS, DEFAULT_WINDOW, Guardrail};

use super::{HookContext, HookError, ToolCallOutcome, ToolHook};

/// Parameter a caller sets to `true` once the user approved a sensitive call.
pub const CONFIRMATION_PARAM: &str = "confirmed";

/// Guardrail hook: rejects unsafe calls before they reach the tool.
pub struct GuardrailHook {
    guardrail: Arc<Guardrail>,
    max_sensitive_ops: u32,
    window: Duration,
}

impl GuardrailHook {
    pub fn new(guardrail: Arc<Guardrail>) -> Self {
        Self::with_limits(guardrail, DEFAULT_MAX_SENSITIVE_OPS, DEFAULT_WINDOW)
    }

    pub fn with_limits(guardrail: Arc<Guardrail>, max_sensitive_ops: u32, window: Duration) -> Self {
        Self {
            guardrail,
            max_sensitive_ops,
            window,
        }
    }

    /// Validate every non-blank string in `value`, replacing each with its
    /// sanitised form.
    fn sanitize_strings(&self, value: &mut Value) -> Result<(), HookError> {
        match value {
            Value::String(text) if text.trim().is_empty() => Ok(()),
            Value::String(text) => {
                let result = self.guardrail.validate_input(text);
                if !result.is_valid {
                    return Err(HookError::Blocked(
                        result.reason.unwrap_or_else(|| "Input rejected".into()),
                    ));
                }
                for warning in &result.warnings {
                    debug!(warning, "tool parameter warning");
                }
                if let Some(sanitized) = result.sanitized_input {
                    *text = sanitized;
                }
                Ok(())
            }
            Value::Array(items) => items.iter_mut().try_for_each(|v| self.sanitize_strings(v)),
            Value::Object(map) => map.values_mut().try_for_each(|v| self.sanitize_strings(v)),
            _ => Ok(()),
        }
    }

    fn filter_strings(&self, value: &mut Value) {
        match value {
            Value::String(text) => *text = self.guardrail.filter_content(text),
            Value::Array(items) => items.iter_mut().for_each(|v| self.filter_strings(v)),
            Value::Object(map) => map.values_mut().for_each(|v| self.filter_strings(v)),
            _ => {}
        }
    }
}

#[async_trait]
impl ToolHook for GuardrailHook {
    async fn before_call(
        &self,
        ctx: &HookContext,
        params: &mut Value,
    ) -> Result<(), HookError> {
        if let Value::Object(map) = params {
            for (key, value) in map.iter_mut() {
                if key != CONFIRMATION_PARAM {
                    self.sanitize_strings(value)?;
                }
            }
        } else {
            self.sanitize_strings(params)?;
        }

        if self.guardrail.requires_confirmation(&ctx.tool_name, params) {
            let confirmed = params
                .get(CONFIRMATION_PARAM)
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if !confirmed {
                return Err(HookError::ConfirmationRequired(format!(
                    "{} needs explicit user confirmation",
                    ctx.tool_name
                )));
            }

            let decision = self.guardrail.check_sensitive_rate_limit(
                &ctx.session_id,
                &ctx.tool_name,
                self.max_sensitive_ops,
                self.window,
            );
            if !decision.allowed {
                debug!(tool = %ctx.tool_name, "rejecting call over the sensitive-operation limit");
                return Err(HookError::RateLimited(
                    "Too many sensitive operations, try again later".into(),
                ));
            }
        }

        Ok(())
    }

    async fn after_call(
        &self,
        ctx: &HookContext,
        outcome: &mut ToolCallOutcome,
    ) -> Result<(), HookError> {
        let ToolCallOutcome::Success(value) = outcome else {
            return Ok(());
        };

        if let Value::String(text) = value {
            let result = self.guardrail.validate_output(text);
            for warning in &result.warnings {
                warn!(tool = %ctx.tool_name, warning, "tool output warning");
            }
        }
        self.filter_strings(value);
        Ok(())
    }

    fn name(&self) -> &str {
        "GuardrailHook"
    }
}
