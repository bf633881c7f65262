//! Detection of unresolved `{{ key }}` template placeholders.

use crate::errors::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static UNRESOLVED_KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{ (.+?) \}\}").expect("unresolved key pattern is valid"));

/// Returns the first placeholder key left in `text`, if any.
pub fn find_unresolved_key(text: &str) -> Option<String> {
    UNRESOLVED_KEY_PATTERN
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|key| key.as_str().to_string())
}

/// Fails with [`Error::UnresolvedTemplateKey`] when `text` still holds a placeholder.
pub fn ensure_resolved(text: &str) -> Result<()> {
    match find_unresolved_key(text) {
        Some(key) => {
            tracing::error!(key = %key, "unresolved template key in engine configuration");
            Err(Error::unresolved_key(key))
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn extracts_key_verbatim() {
        assert_eq!(find_unresolved_key("domain: {{ placeholder }}"), Some("placeholder".into()));
        assert_eq!(
            find_unresolved_key("{{ stats_domain.v2 }}:443"),
            Some("stats_domain.v2".into())
        );
    }

    #[test]
    fn reports_first_of_several_keys() {
        assert_eq!(find_unresolved_key("{{ a }} and {{ b }}"), Some("a".into()));
    }

    #[test]
    fn ignores_text_without_the_exact_delimiters() {
        assert_eq!(find_unresolved_key("no placeholders here"), None);
        assert_eq!(find_unresolved_key("{{placeholder}}"), None);
        assert_eq!(find_unresolved_key("{ placeholder }"), None);
    }

    #[test]
    fn ensure_resolved_returns_typed_error() {
        assert!(ensure_resolved("app_id: com.example").is_ok());
        match ensure_resolved("app_id: {{ app_id }}") {
            Err(Error::UnresolvedTemplateKey { key }) => assert_eq!(key, "app_id"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    #[traced_test]
    fn unresolved_key_is_logged() {
        assert!(ensure_resolved("stats_domain: {{ stats_domain }}").is_err());
        assert!(logs_contain("unresolved template key"));
        assert!(logs_contain("stats_domain"));
    }
}
