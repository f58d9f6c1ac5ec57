//! Run a tool future inside a [`HookPipeline`].

use std::future::Future;

use serde_json::Value;
use tracing::warn;

use crate::hooks::{HookContext, HookError, HookPipeline, ToolCallOutcome};

/// Run `tool` with `params`, surrounded by the pipeline's hooks.
///
/// A call rejected by a `before_call` hook never reaches the tool, but the
/// `after_call` hooks still see it as an error outcome so it is audited once.
/// A tool error comes back as [`HookError::ToolFailed`].
pub async fn run_tool<F, Fut>(
    pipeline: &HookPipeline,
    mut ctx: HookContext,
    mut params: Value,
    tool: F,
) -> Result<Value, HookError>
where
    F: FnOnce(Value) -> Fut,
    Fut: Future<Output = Result<Value, String>>,
{
    ctx.input = params.clone();

    if let Err(rejection) = pipeline.run_before(&ctx, &mut params).await {
        let mut outcome = ToolCallOutcome::Error(rejection.to_string());
        if let Err(e) = pipeline.run_after(&ctx, &mut outcome).await {
            warn!(tool = %ctx.tool_name, error = %e, "after_call failed for rejected call");
        }
        return Err(rejection);
    }

    ctx.input = params.clone();
    let mut outcome = match tool(params).await {
        Ok(value) => ToolCallOutcome::Success(value),
        Err(message) => ToolCallOutcome::Error(message),
    };
    pipeline.run_after(&ctx, &mut outcome).await?;

    match outcome {
        ToolCallOutcome::Success(value) => Ok(value),
        ToolCallOutcome::Error(message) => Err(HookError::ToolFailed(message)),
    }
}
