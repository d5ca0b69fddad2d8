//! Helpers for sanitizing data before it enters logs and span attributes.
//!
//! Artifact paths can reveal user directories and provider URLs can carry
//! keys, so only the redacted forms are logged.

use std::path::Path;

/// Query parameters whose values are replaced by [`redact_url`].
const SECRET_PARAMS: &[&str] = &["key", "api_key", "token", "access_token"];

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Masks userinfo and secret query parameters in a URL.
///
/// - `https://user:pw@host/v1` → `https://****@host/v1`
/// - `https://host/v1?key=abc&alt=json` → `https://host/v1?key=****&alt=json`
pub fn redact_url(url: &str) -> String {
    let (base, query) = match url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (url, None),
    };

    let mut redacted = match base.find("://") {
        Some(scheme_end) => {
            let after_scheme = &base[scheme_end + 3..];
            let host_end = after_scheme.find('/').unwrap_or(after_scheme.len());
            match after_scheme[..host_end].rfind('@') {
                Some(at_pos) => format!(
                    "{}****@{}",
                    &base[..scheme_end + 3],
                    &after_scheme[at_pos + 1..]
                ),
                None => base.to_string(),
            }
        }
        None => base.to_string(),
    };

    if let Some(query) = query {
        let params: Vec<String> = query
            .split('&')
            .map(|pair| match pair.split_once('=') {
                Some((name, _)) if SECRET_PARAMS.contains(&name.to_lowercase().as_str()) => {
                    format!("{}=****", name)
                }
                _ => pair.to_string(),
            })
            .collect();
        redacted.push('?');
        redacted.push_str(&params.join("&"));
    }

    redacted
}
