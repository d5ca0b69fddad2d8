//! Shared HTTP client setup for the provider adapters.

use std::time::Duration;

use reqwest::Client;

/// Maximum length for error bodies copied into error messages and logs.
const MAX_ERROR_BODY_LENGTH: usize = 200;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Creates an HTTP client with a connect timeout and an overall request timeout.
pub fn create_http_client(request_timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(request_timeout)
        .build()
}

/// Truncates a provider error body so vendor payloads do not flood the logs.
pub fn sanitize_error_body(body: &str) -> String {
    if body.chars().count() > MAX_ERROR_BODY_LENGTH {
        let cut: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
        format!("{}... (truncated)", cut)
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_short_body_unchanged() {
        assert_eq!(sanitize_error_body("bad request"), "bad request");
    }

    #[test]
    fn test_sanitize_long_body_truncated() {
        let body = "é".repeat(500);
        let out = sanitize_error_body(&body);
        assert!(out.ends_with("... (truncated)"));
        assert_eq!(out.chars().count(), MAX_ERROR_BODY_LENGTH + "... (truncated)".len());
    }
}
