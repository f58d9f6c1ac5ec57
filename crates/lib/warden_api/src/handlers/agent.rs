// @zen-component: AGENT-Endpoints
//
//! Agent guardrail and action-log handlers.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::{Extension, Json};
use warden_core::audit::{DEFAULT_RECENT_LIMIT, DEFAULT_SESSION_LIMIT};
use warden_core::guardrail::ValidationResult;
use warden_core::models::agent::{ActionStats, AgentAction, NewAgentAction};
use warden_core::models::auth::Role;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    ActionsQuery, FilterResponse, MessageResponse, PreflightRequest, PreflightResponse, TextRequest,
};
use crate::services::agent::{self, Caller};

/// First hop of `x-forwarded-for`, else `x-real-ip`.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

fn caller(user: &AuthenticatedUser, headers: &HeaderMap) -> Caller {
    Caller {
        user_id: Some(user.user_id().to_string()),
        ip_address: client_ip(headers),
    }
}

/// Admin means the `admin` role or an id listed in `ADMIN_USER_IDS`.
async fn is_admin(state: &AppState, user: &AuthenticatedUser) -> AppResult<bool> {
    if state.config.is_admin(user.user_id()) {
        return Ok(true);
    }
    Ok(state
        .users
        .find_by_id(user.user_id())
        .await?
        .is_some_and(|u| u.role == Role::Admin))
}

async fn require_admin(state: &AppState, user: &AuthenticatedUser) -> AppResult<()> {
    if is_admin(state, user).await? {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin access required".into()))
    }
}

/// `POST /agent/validate-input`
pub async fn validate_input_handler(
    State(state): State<AppState>,
    Json(body): Json<TextRequest>,
) -> Json<ValidationResult> {
    Json(state.guardrail.validate_input(&body.text))
}

/// `POST /agent/validate-output`
pub async fn validate_output_handler(
    State(state): State<AppState>,
    Json(body): Json<TextRequest>,
) -> Json<ValidationResult> {
    Json(state.guardrail.validate_output(&body.text))
}

/// `POST /agent/filter`: redact secrets and home paths.
pub async fn filter_handler(
    State(state): State<AppState>,
    Json(body): Json<TextRequest>,
) -> Json<FilterResponse> {
    Json(FilterResponse {
        content: state.guardrail.filter_content(&body.text),
    })
}

/// `POST /agent/preflight`: may this tool call go ahead?
pub async fn preflight_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    headers: HeaderMap,
    Json(body): Json<PreflightRequest>,
) -> Json<PreflightResponse> {
    let caller = caller(&user, &headers);
    Json(agent::preflight(&state.guardrail, &state.actions, &body, &caller))
}

/// `POST /agent/actions`: record an action reported by the agent runtime.
pub async fn record_action_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    headers: HeaderMap,
    Json(body): Json<NewAgentAction>,
) -> AppResult<Json<AgentAction>> {
    if body.session_id.trim().is_empty() || body.tool_name.trim().is_empty() {
        return Err(AppError::Validation("sessionId and toolName are required".into()));
    }
    let caller = caller(&user, &headers);
    Ok(Json(agent::record_action(&state.actions, body, &caller)))
}

/// `GET /agent/actions?sessionId=&limit=`
///
/// Admins see every action. Other callers only see their own.
pub async fn list_actions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<ActionsQuery>,
) -> AppResult<Json<Vec<AgentAction>>> {
    let session_id = query.session_id.as_deref();
    let limit = query.limit.unwrap_or(if session_id.is_some() {
        DEFAULT_SESSION_LIMIT
    } else {
        DEFAULT_RECENT_LIMIT
    });

    let actions = if !is_admin(&state, &user).await? {
        state.actions.get_user_actions(user.user_id(), session_id, limit)
    } else if let Some(session_id) = session_id {
        state.actions.get_session_actions(session_id, limit)
    } else {
        state.actions.get_recent_actions(limit)
    };
    Ok(Json(actions))
}

/// `GET /agent/actions/stats`: admin only.
pub async fn action_stats_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<ActionStats>> {
    require_admin(&state, &user).await?;
    Ok(Json(state.actions.get_action_stats()))
}

/// `DELETE /agent/actions`: admin only.
pub async fn clear_actions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<MessageResponse>> {
    require_admin(&state, &user).await?;
    state.actions.clear_action_log();
    Ok(Json(MessageResponse::ok("Action log cleared")))
}
