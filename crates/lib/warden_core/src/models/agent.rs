//! Agent action log models.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded agent tool invocation. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentAction {
    /// UUIDv7, so ids sort by creation time.
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub tool_name: String,
    pub input: serde_json::Value,
    pub output: serde_json::Value,
    pub success: bool,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// An action as reported by a caller, before id and timestamp are assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAgentAction {
    pub session_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub input: serde_json::Value,
    #[serde(default)]
    pub output: serde_json::Value,
    pub success: bool,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Aggregate statistics over the action log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionStats {
    /// Entries currently held in the log.
    pub total_actions: usize,
    pub last_hour: usize,
    pub last_24_hours: usize,
    /// Percentage (0–100) of successful actions in the last 24 hours.
    pub success_rate: f64,
    /// Calls per tool in the last 24 hours.
    pub tool_usage: HashMap<String, usize>,
    /// Mean duration of actions in the last 24 hours.
    pub avg_duration_ms: f64,
}
