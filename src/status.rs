//! HTTP status naming shared by the tool and model adapters.

use reqwest::StatusCode;

/// Compact name for an HTTP status, e.g. `500` → `"InternalServerError"`.
///
/// Built from the canonical reason phrase with everything but ASCII
/// alphanumerics stripped. Codes without a reason phrase fall back to the
/// decimal code.
pub fn status_name(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(|reason| {
            reason
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| status.to_string())
}
