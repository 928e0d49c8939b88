//! Retryable-error classification (part of C6): decides whether an upstream error
//! is worth one retry on the fallback model, or should be surfaced to the client
//! as-is.

const RETRYABLE_TRIGGERS: [&str; 10] = [
    "rate limit",
    "limit exceeded",
    "quota",
    "429",
    "timeout",
    "timed out",
    "deadline",
    "overloaded",
    "temporarily unavailable",
    "service unavailable",
];

/// Case-insensitive substring match against a fixed set of transient-failure phrases.
pub fn is_retryable_error(error_text: &str) -> bool {
    if error_text.is_empty() {
        return false;
    }
    let lower = error_text.to_lowercase();
    RETRYABLE_TRIGGERS.iter().any(|trigger| lower.contains(trigger))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_known_transient_phrases_case_insensitively() {
        assert!(is_retryable_error("Rate Limit exceeded, try again"));
        assert!(is_retryable_error("upstream returned 429"));
        assert!(is_retryable_error("connection timed out"));
        assert!(is_retryable_error("Service Unavailable"));
    }

    #[test]
    fn rejects_unrelated_or_empty_errors() {
        assert!(!is_retryable_error(""));
        assert!(!is_retryable_error("invalid API key"));
        assert!(!is_retryable_error("model not found"));
    }
}
