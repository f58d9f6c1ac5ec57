// @zen-component: AGENT-Guardrail
//
//! Input/output guardrails for the LLM-agent path.
//!
//! Inbound prompts are rejected on injection markers and sanitised;
//! outbound model text is only flagged. All checks are heuristic
//! defense-in-depth over ordered [`RuleSet`]s.

pub mod rate_limit;
pub mod rules;
pub mod sanitize;

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

pub use rate_limit::{
    DEFAULT_MAX_SENSITIVE_OPS, DEFAULT_WINDOW, InMemoryRateLimitStore, RateLimitDecision,
    RateLimitKey, RateLimitStore,
};
pub use rules::{Detector, RegexDetector, RuleSet};
pub use sanitize::{filter_content, sanitize_input};

/// Maximum accepted prompt length in characters.
pub const MAX_INPUT_CHARS: usize = 5000;

/// Tools whose effects cannot be undone.
pub const IRREVERSIBLE_TOOLS: &[&str] = &[
    "delete_file",
    "delete_directory",
    "delete_resource",
    "drop_database",
    "execute_command",
    "deploy_action",
    "send_email",
    "modify_permissions",
    "transfer_funds",
];

/// Keywords that make any tool input require confirmation.
pub const DESTRUCTIVE_KEYWORDS: &[&str] = &[
    "delete", "drop", "remove", "destroy", "truncate", "rm -rf", "format", "shutdown", "wipe",
    "overwrite",
];

/// Domains model output may link to without a warning.
pub const DEFAULT_ALLOWED_DOMAINS: &[&str] = &[
    "github.com",
    "githubusercontent.com",
    "linkedin.com",
    "developer.mozilla.org",
    "docs.rs",
    "crates.io",
    "rust-lang.org",
    "npmjs.com",
    "nodejs.org",
    "nextjs.org",
    "react.dev",
    "stackoverflow.com",
    "wikipedia.org",
];

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"'()\[\]]+"#).expect("valid regex"));

struct DefaultRules {
    injection: RuleSet,
    sensitive: RuleSet,
    pii: RuleSet,
    dangerous_output: RuleSet,
}

static DEFAULT_RULES: LazyLock<DefaultRules> = LazyLock::new(|| DefaultRules {
    injection: RuleSet::from_patterns(rules::INJECTION_PATTERNS).expect("injection patterns"),
    sensitive: RuleSet::from_patterns(rules::SENSITIVE_PATTERNS).expect("sensitive patterns"),
    pii: RuleSet::from_patterns(rules::PII_PATTERNS).expect("pii patterns"),
    dangerous_output: RuleSet::from_patterns(rules::DANGEROUS_OUTPUT_PATTERNS)
        .expect("dangerous output patterns"),
});

/// Uniform verdict for inbound and outbound text.
///
/// `blocked` implies `!is_valid`; warnings may accompany a valid result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sanitized_input: Option<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn blocked(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            blocked: true,
            reason: Some(reason.into()),
            sanitized_input: None,
            warnings: Vec::new(),
        }
    }
}

/// Tunable limits.
#[derive(Debug, Clone)]
pub struct GuardrailPolicy {
    pub max_input_chars: usize,
    pub allowed_domains: Vec<String>,
    pub irreversible_tools: Vec<String>,
    pub destructive_keywords: Vec<String>,
}

impl Default for GuardrailPolicy {
    fn default() -> Self {
        Self {
            max_input_chars: MAX_INPUT_CHARS,
            allowed_domains: DEFAULT_ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect(),
            irreversible_tools: IRREVERSIBLE_TOOLS.iter().map(|t| t.to_string()).collect(),
            destructive_keywords: DESTRUCTIVE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Guardrail instance owning its rule sets and rate-limit store.
pub struct Guardrail {
    policy: GuardrailPolicy,
    injection: RuleSet,
    sensitive: RuleSet,
    pii: RuleSet,
    dangerous_output: RuleSet,
    rate_limits: Arc<dyn RateLimitStore>,
}

impl Guardrail {
    /// Create a guardrail with the built-in rules.
    ///
    /// Destructive keywords match case-insensitively.
    pub fn new(mut policy: GuardrailPolicy, rate_limits: Arc<dyn RateLimitStore>) -> Self {
        for keyword in &mut policy.destructive_keywords {
            *keyword = keyword.to_lowercase();
        }
        Self {
            policy,
            injection: DEFAULT_RULES.injection.clone(),
            sensitive: DEFAULT_RULES.sensitive.clone(),
            pii: DEFAULT_RULES.pii.clone(),
            dangerous_output: DEFAULT_RULES.dangerous_output.clone(),
            rate_limits,
        }
    }

    /// Default policy backed by an in-memory rate-limit store.
    pub fn in_memory() -> Self {
        Self::new(
            GuardrailPolicy::default(),
            Arc::new(InMemoryRateLimitStore::new()),
        )
    }

    pub fn policy(&self) -> &GuardrailPolicy {
        &self.policy
    }

    pub fn add_injection_detector(&mut self, detector: Arc<dyn Detector>) {
        self.injection.push(detector);
    }

    pub fn add_sensitive_detector(&mut self, detector: Arc<dyn Detector>) {
        self.sensitive.push(detector);
    }

    pub fn add_pii_detector(&mut self, detector: Arc<dyn Detector>) {
        self.pii.push(detector);
    }

    pub fn add_output_detector(&mut self, detector: Arc<dyn Detector>) {
        self.dangerous_output.push(detector);
    }

    /// Validate and sanitise a prompt bound for the model.
    pub fn validate_input(&self, input: &str) -> ValidationResult {
        if input.trim().is_empty() {
            return ValidationResult::blocked("Empty input");
        }

        if input.chars().count() > self.policy.max_input_chars {
            return ValidationResult::blocked(format!(
                "Input exceeds maximum length of {} characters",
                self.policy.max_input_chars
            ));
        }

        if let Some(rule) = self.injection.first_match(input) {
            warn!(rule, "prompt injection pattern detected");
            return ValidationResult::blocked("Potential prompt injection detected");
        }

        let mut warnings = Vec::new();
        if let Some(rule) = self.sensitive.first_match(input) {
            debug!(rule, "sensitive operation pattern detected");
            warnings.push("Input requests a potentially sensitive operation".to_string());
        }
        if let Some(rule) = self.pii.first_match(input) {
            debug!(rule, "pii pattern detected");
            warnings.push("Input may contain personally identifiable information".to_string());
        }

        ValidationResult {
            is_valid: true,
            blocked: false,
            reason: None,
            sanitized_input: Some(sanitize_input(input)),
            warnings,
        }
    }

    /// Flag problems in model output. The text itself is never modified.
    pub fn validate_output(&self, output: &str) -> ValidationResult {
        if output.trim().is_empty() {
            return ValidationResult {
                is_valid: false,
                blocked: false,
                reason: Some("Empty response".to_string()),
                sanitized_input: None,
                warnings: Vec::new(),
            };
        }

        let mut warnings = Vec::new();
        if let Some(rule) = self.dangerous_output.first_match(output) {
            debug!(rule, "dangerous code pattern in output");
            warnings.push("Response contains potentially dangerous code".to_string());
        }

        let suspicious = self.count_suspicious_urls(output);
        if suspicious > 0 {
            warnings.push(format!(
                "Response contains {suspicious} URL(s) outside the allowed domains"
            ));
        }

        ValidationResult {
            is_valid: true,
            blocked: false,
            reason: None,
            sanitized_input: None,
            warnings,
        }
    }

    fn count_suspicious_urls(&self, text: &str) -> usize {
        URL_PATTERN
            .find_iter(text)
            .filter(|m| !self.is_allowed_url(m.as_str()))
            .count()
    }

    fn is_allowed_url(&self, raw: &str) -> bool {
        let Ok(url) = Url::parse(raw) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.policy.allowed_domains.iter().any(|domain| {
            host == *domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// Whether a tool call must be confirmed by the user first.
    ///
    /// Over-inclusive on purpose: any destructive keyword anywhere in the
    /// serialised input triggers it.
    pub fn requires_confirmation(&self, tool_name: &str, input: &serde_json::Value) -> bool {
        if self.policy.irreversible_tools.iter().any(|t| t == tool_name) {
            return true;
        }
        let serialized = input.to_string().to_lowercase();
        self.policy
            .destructive_keywords
            .iter()
            .any(|keyword| serialized.contains(keyword.as_str()))
    }

    /// Fixed-window limit on sensitive tool calls per `(session, tool)`.
    pub fn check_sensitive_rate_limit(
        &self,
        session_id: &str,
        tool_name: &str,
        max_ops: u32,
        window: Duration,
    ) -> RateLimitDecision {
        let key = RateLimitKey::new(session_id, tool_name);
        let decision = self.rate_limits.hit(&key, max_ops, window, Utc::now());
        if !decision.allowed {
            warn!(session_id, tool_name, "sensitive operation rate limit exceeded");
        }
        decision
    }

    /// Redact secrets and home paths from text shown to a user.
    pub fn filter_content(&self, content: &str) -> String {
        filter_content(content)
    }
}

impl Default for Guardrail {
    fn default() -> Self {
        Self::in_memory()
    }
}
