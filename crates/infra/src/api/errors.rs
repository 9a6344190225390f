//! Response classification
//!
//! Maps a non-success status and its body onto the domain error taxonomy.
//! The classifier is the only place that interprets status codes.

use once_cell::sync::Lazy;
use permsys_domain::ApiError;
use regex::Regex;
use reqwest::StatusCode;

/// Synthetic 409 the control plane returns while another mutation in the
/// same permission system is in flight.
static SCOPE_CHURN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)restricted.*configuration.*changed")
        .expect("SCOPE_CHURN regex should compile - this is a bug")
});

/// Hint appended to scope-churn conflicts.
pub const SCOPE_CHURN_HINT: &str =
    "another change to this permission system is in progress; the operation is retried automatically";

/// Classify a non-success response.
pub fn classify(status: StatusCode, body: &str) -> ApiError {
    let message = describe(status, body);

    match status.as_u16() {
        404 => ApiError::NotFound(message),
        409 if SCOPE_CHURN.is_match(&message) => {
            ApiError::Conflict(format!("{message} ({SCOPE_CHURN_HINT})"))
        }
        409 => ApiError::Conflict(message),
        412 => ApiError::PreconditionFailed(message),
        429 => ApiError::Throttled(message),
        500..=599 => ApiError::Transient(message),
        _ => ApiError::Fatal(message),
    }
}

/// Human-readable message from an error body.
///
/// Reads the `message` or `error` key of a JSON object body; otherwise the
/// trimmed raw body.
pub fn extract_message(body: &str) -> String {
    if let Ok(serde_json::Value::Object(object)) = serde_json::from_str::<serde_json::Value>(body)
    {
        for key in ["message", "error"] {
            if let Some(serde_json::Value::String(text)) = object.get(key) {
                if !text.trim().is_empty() {
                    return text.trim().to_string();
                }
            }
        }
    }
    body.trim().to_string()
}

fn describe(status: StatusCode, body: &str) -> String {
    let message = extract_message(body);
    let reason = status.canonical_reason().unwrap_or("unknown status");
    if message.is_empty() {
        format!("HTTP {} {reason}", status.as_u16())
    } else {
        format!("HTTP {}: {message}", status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use permsys_domain::ApiErrorKind;

    use super::*;

    fn kind_of(code: u16) -> ApiErrorKind {
        classify(StatusCode::from_u16(code).unwrap(), "").kind()
    }

    #[test]
    fn status_codes_map_to_categories() {
        assert_eq!(kind_of(404), ApiErrorKind::NotFound);
        assert_eq!(kind_of(409), ApiErrorKind::Conflict);
        assert_eq!(kind_of(412), ApiErrorKind::PreconditionFailed);
        assert_eq!(kind_of(429), ApiErrorKind::Throttled);
        assert_eq!(kind_of(500), ApiErrorKind::Transient);
        assert_eq!(kind_of(503), ApiErrorKind::Transient);
        assert_eq!(kind_of(400), ApiErrorKind::Fatal);
        assert_eq!(kind_of(401), ApiErrorKind::Fatal);
        assert_eq!(kind_of(403), ApiErrorKind::Fatal);
        assert_eq!(kind_of(422), ApiErrorKind::Fatal);
    }

    #[test]
    fn message_prefers_json_fields() {
        assert_eq!(extract_message(r#"{"message":"role exists"}"#), "role exists");
        assert_eq!(extract_message(r#"{"error":"bad token"}"#), "bad token");
        assert_eq!(extract_message(r#"{"message":"","error":"fallback"}"#), "fallback");
    }

    #[test]
    fn message_falls_back_to_raw_body() {
        assert_eq!(extract_message("  upstream timeout \n"), "upstream timeout");
        assert_eq!(extract_message(r#"["not","an","object"]"#), r#"["not","an","object"]"#);
        assert_eq!(extract_message(r#"{"code":7}"#), r#"{"code":7}"#);
    }

    #[test]
    fn empty_body_uses_reason_phrase() {
        let err = classify(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(err.message(), "HTTP 503 Service Unavailable");
    }

    #[test]
    fn scope_churn_conflicts_carry_retry_hint() {
        let err = classify(
            StatusCode::CONFLICT,
            r#"{"message":"Restricted configuration has been changed by another request"}"#,
        );
        assert_eq!(err.kind(), ApiErrorKind::Conflict);
        assert!(err.message().contains("retried automatically"));

        let plain = classify(StatusCode::CONFLICT, r#"{"message":"name already taken"}"#);
        assert!(!plain.message().contains("retried automatically"));
    }
}
