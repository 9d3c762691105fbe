/// Failures surfaced by the core. None of them are fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    /// Request rejected, timed out, or answered with a non-success status.
    #[error("Network error: {0}")]
    Network(String),

    /// Expected fields missing or invalid in a provider payload.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Empty search query; nothing was requested.
    #[error("Search query is empty")]
    UserInputRejected,

    /// Place name lookup failed, dependent actions are disabled.
    #[error("Place name could not be resolved for ({lat}, {lon})")]
    ResolutionFailed { lat: f64, lon: f64 },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ForecastError {
    /// Whether showing a "try again" affordance makes sense.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ForecastError::Network(_))
    }

    pub(crate) fn malformed(what: impl std::fmt::Display) -> Self {
        ForecastError::MalformedResponse(what.to_string())
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_errors_are_retryable() {
        assert!(ForecastError::Network("timeout".into()).is_retryable());
        assert!(!ForecastError::malformed("missing list").is_retryable());
        assert!(!ForecastError::UserInputRejected.is_retryable());
        assert!(!ForecastError::ResolutionFailed { lat: 1.0, lon: 2.0 }.is_retryable());
    }

    #[test]
    fn truncate_body_keeps_short_bodies() {
        assert_eq!(truncate_body("nope"), "nope");
    }

    #[test]
    fn truncate_body_cuts_long_bodies_on_char_boundary() {
        let body = "é".repeat(150);
        let out = truncate_body(&body);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 203);
    }
}
