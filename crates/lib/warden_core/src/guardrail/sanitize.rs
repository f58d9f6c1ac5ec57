//! Input sanitisation and content redaction.

use std::sync::LazyLock;

use regex::Regex;

/// Replacement for redacted credentials.
pub const REDACTED: &str = "[REDACTED]";

/// Replacement for redacted home-directory paths.
pub const REDACTED_PATH: &str = "[REDACTED_PATH]";

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid regex"));

static EVENT_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bon[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#).expect("valid regex")
});

static JAVASCRIPT_URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript\s*:").expect("valid regex"));

static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

static SECRET_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b[a-z0-9_\-]*(key|secret|password|passwd|token)["']?\s*[:=]\s*["']?[A-Za-z0-9_\-./+=]{20,}["']?"#,
    )
    .expect("valid regex")
});

static HOME_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(/home/[^/\s]+|/Users/[^/\s]+|(?i:[a-z]):\\Users\\[^\\\s]+)").expect("valid regex")
});

/// Strip script blocks, inline event handlers, `javascript:` URIs and all
/// remaining tags, then trim surrounding whitespace.
pub fn sanitize_input(text: &str) -> String {
    let text = SCRIPT_BLOCK.replace_all(text, "");
    let text = EVENT_HANDLER.replace_all(&text, "");
    let text = JAVASCRIPT_URI.replace_all(&text, "");
    let text = ANY_TAG.replace_all(&text, "");
    text.trim().to_string()
}

/// Redact credential assignments and home-directory paths from text shown to a user.
pub fn filter_content(content: &str) -> String {
    let redacted = SECRET_ASSIGNMENT.replace_all(content, REDACTED);
    HOME_PATH.replace_all(&redacted, REDACTED_PATH).into_owned()
}
