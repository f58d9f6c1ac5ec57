//! Ordered detector lists used by the guardrail.
//!
//! Pattern matching here is defense-in-depth: it catches known phrasings and
//! markers, it does not classify intent. New detectors can be appended to a
//! [`RuleSet`] without touching the call sites.

use std::sync::Arc;

use regex::Regex;

/// A single text predicate.
pub trait Detector: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    fn detect(&self, text: &str) -> bool;
}

/// Detector backed by a compiled regular expression.
pub struct RegexDetector {
    name: String,
    regex: Regex,
}

impl RegexDetector {
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            regex: Regex::new(pattern)?,
        })
    }
}

impl Detector for RegexDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Ordered list of detectors. The first match wins.
#[derive(Clone, Default)]
pub struct RuleSet {
    detectors: Vec<Arc<dyn Detector>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a rule set from `(name, pattern)` pairs.
    pub fn from_patterns(patterns: &[(&str, &str)]) -> Result<Self, regex::Error> {
        let mut set = Self::new();
        for (name, pattern) in patterns {
            set.push(Arc::new(RegexDetector::new(*name, pattern)?));
        }
        Ok(set)
    }

    pub fn push(&mut self, detector: Arc<dyn Detector>) {
        self.detectors.push(detector);
    }

    /// Name of the first detector matching `text`.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.detectors
            .iter()
            .find(|d| d.detect(text))
            .map(|d| d.name())
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

/// Role-override phrasing, fake system/instruction markers and model control tokens.
pub const INJECTION_PATTERNS: &[(&str, &str)] = &[
    (
        "ignore_instructions",
        r"(?i)\b(ignore|disregard|forget|override)\s+(all\s+|any\s+|the\s+|your\s+)?(previous|prior|above|earlier|system)\s+(instructions?|prompts?|rules|directions)",
    ),
    (
        "role_override",
        r"(?i)\b(you\s+are\s+now|from\s+now\s+on\s+you\s+are|pretend\s+(to\s+be|you\s+are)|act\s+as\s+if\s+you\s+are)\b",
    ),
    (
        "reveal_prompt",
        r"(?i)\b(reveal|show|print|repeat)\s+(me\s+)?(your|the)\s+(system\s+prompt|initial\s+instructions|hidden\s+instructions)",
    ),
    ("system_marker", r"(?im)^\s*(system|assistant)\s*:"),
    ("bracket_marker", r"(?i)\[\s*/?\s*(system|inst|instructions?)\s*\]"),
    ("heading_marker", r"(?i)#{2,}\s*(system|instructions?)\b"),
    ("llama_marker", r"<<\s*/?\s*SYS\s*>>"),
    ("chatml_token", r"<\|\s*(im_start|im_end|system|user|assistant|endoftext)\s*\|>"),
];

/// Destructive shell/SQL/script phrasing. Warning only.
pub const SENSITIVE_PATTERNS: &[(&str, &str)] = &[
    (
        "destructive_request",
        r"(?i)\b(delete|remove|erase|wipe|destroy)\s+(all|every|everything|the\s+entire)\b",
    ),
    ("rm_rf", r"(?i)\brm\s+-(rf|fr|r)\b"),
    ("sql_drop", r"(?i)\b(drop|truncate)\s+(table|database|schema)\b"),
    ("sql_delete", r"(?i)\bdelete\s+from\s+\w+"),
    ("privilege", r"(?i)\b(sudo|chmod\s+777|chown\s+-r)\b"),
    ("disk_format", r"(?i)\b(mkfs|format\s+[a-z]:|dd\s+if=)"),
    ("script_exec", r"(?i)\b(eval|exec)\s*\("),
];

/// SSN-like, card-like and passport-like numbers. Warning only.
pub const PII_PATTERNS: &[(&str, &str)] = &[
    ("ssn", r"\b\d{3}-\d{2}-\d{4}\b"),
    ("card_number", r"\b(?:\d{4}[-\s]?){3}\d{4}\b"),
    ("passport", r"\b[A-Z]{1,2}\d{6,9}\b"),
];

/// Dangerous code in model output. Warning only.
pub const DANGEROUS_OUTPUT_PATTERNS: &[(&str, &str)] = &[
    (
        "destructive_shell_block",
        r"(?is)```\s*(bash|sh|shell|zsh|powershell|cmd)\b.*?\b(rm\s+-|del\s+/|format\s|mkfs|dd\s+if=|shutdown|drop\s+table)",
    ),
    ("script_tag", r"(?i)<script\b"),
    ("eval_call", r"(?i)\b(eval|exec|Function)\s*\("),
];
