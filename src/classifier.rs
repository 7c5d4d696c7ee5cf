//! Provider Fault Classifier
//!
//! Maps raw provider error text onto a small set of stable categories:
//! - RateLimited: quota or throttling pushback (e.g. "Rate limit exceeded")
//! - Misconfigured: the provider rejected the credential (e.g. "API key not valid")
//! - InputTooLarge: the prompt blew the model's context window
//! - Unclassified: anything else, surfaced with a truncated raw detail

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFault {
    RateLimited,
    Misconfigured,
    InputTooLarge,
    Unclassified,
}

/// Classifier seam. Sessions accept any function with this shape.
pub type FaultClassifier = fn(&str) -> ProviderFault;

/// Ordered substring rules, matched case-insensitively. First match wins.
const FAULT_RULES: &[(&str, ProviderFault)] = &[
    ("rate limit", ProviderFault::RateLimited),
    ("api key", ProviderFault::Misconfigured),
    ("context length", ProviderFault::InputTooLarge),
];

/// Cap on raw provider detail carried into an unclassified fault.
pub const MAX_DETAIL_LEN: usize = 240;

/// Classify raw provider error text.
pub fn classify_fault(raw: &str) -> ProviderFault {
    let haystack = raw.to_lowercase();

    FAULT_RULES
        .iter()
        .find(|(needle, _)| haystack.contains(needle))
        .map(|(_, fault)| *fault)
        .unwrap_or(ProviderFault::Unclassified)
}

/// Bound raw provider detail before it reaches a response body.
pub fn truncate_detail(raw: &str) -> String {
    if raw.chars().count() <= MAX_DETAIL_LEN {
        return raw.to_string();
    }

    let cut: String = raw.chars().take(MAX_DETAIL_LEN).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_variants() {
        let cases = vec![
            "Rate limit exceeded",
            "RATE LIMIT hit for model",
            "429: rate limit, retry later",
        ];

        for c in cases {
            assert_eq!(classify_fault(c), ProviderFault::RateLimited);
        }
    }

    #[test]
    fn test_credential_rejection() {
        let cases = vec![
            "API key not valid. Please pass a valid API key.",
            "invalid api key supplied",
        ];

        for c in cases {
            assert_eq!(classify_fault(c), ProviderFault::Misconfigured);
        }
    }

    #[test]
    fn test_context_window_overflow() {
        assert_eq!(
            classify_fault("Request exceeds the model's context length"),
            ProviderFault::InputTooLarge
        );
    }

    #[test]
    fn test_unknown_text_is_unclassified() {
        let cases = vec!["connection reset by peer", "internal provider error", ""];

        for c in cases {
            assert_eq!(classify_fault(c), ProviderFault::Unclassified);
        }
    }

    #[test]
    fn test_first_rule_wins() {
        assert_eq!(
            classify_fault("api key quota exhausted: rate limit reached"),
            ProviderFault::RateLimited
        );
    }

    #[test]
    fn test_truncation_bounds_detail() {
        let long = "x".repeat(MAX_DETAIL_LEN * 2);
        let truncated = truncate_detail(&long);

        assert_eq!(truncated.chars().count(), MAX_DETAIL_LEN + 3);
        assert!(truncated.ends_with("..."));

        let short = "short detail";
        assert_eq!(truncate_detail(short), short);
    }
}
