//! Credential-check endpoint
//!
//! Verifies a supplied password against a server-held secret. Three outcomes:
//! missing secret is an operator problem (500), a mismatch is a user problem
//! (403), a match is 200. The expected secret never appears in a response.

use serde::Deserialize;
use serde_json::json;

use super::ApiResponse;

#[derive(Debug, Deserialize)]
struct CredentialBody {
    password: Option<String>,
}

/// Handle a POST to the credential-check function
///
/// `secret` is the configured server-side password; `body` is the raw request
/// body. Malformed JSON is treated as an empty password, never an error.
pub fn verify_password(secret: Option<&str>, body: &[u8]) -> ApiResponse {
    let expected = secret.unwrap_or("").trim();
    if expected.is_empty() {
        return ApiResponse::json(500, json!({ "ok": false, "error": "Server not configured" }));
    }

    let supplied = serde_json::from_slice::<CredentialBody>(body)
        .ok()
        .and_then(|b| b.password)
        .map(|p| p.trim().to_string())
        .unwrap_or_default();

    if supplied.is_empty() || supplied != expected {
        return ApiResponse::json(403, json!({ "ok": false }));
    }

    ApiResponse::json(200, json!({ "ok": true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_password_accepted() {
        let res = verify_password(Some("hunter2"), br#"{"password":"hunter2"}"#);
        assert_eq!(res.status, 200);
        assert_eq!(res.body["ok"], true);
    }

    #[test]
    fn test_password_is_trimmed_both_sides() {
        let res = verify_password(Some("  hunter2  "), br#"{"password":" hunter2 "}"#);
        assert_eq!(res.status, 200);
    }

    #[test]
    fn test_wrong_password_denied() {
        let res = verify_password(Some("hunter2"), br#"{"password":"letmein"}"#);
        assert_eq!(res.status, 403);
        assert_eq!(res.body["ok"], false);
    }

    #[test]
    fn test_empty_body_denied() {
        let res = verify_password(Some("hunter2"), br"{}");
        assert_eq!(res.status, 403);
    }

    #[test]
    fn test_malformed_json_treated_as_empty_password() {
        let res = verify_password(Some("hunter2"), b"not json at all {{{");
        assert_eq!(res.status, 403);
        assert_eq!(res.body["ok"], false);
    }

    #[test]
    fn test_unconfigured_secret_is_500() {
        for secret in [None, Some(""), Some("   ")] {
            let res = verify_password(secret, br#"{"password":"anything"}"#);
            assert_eq!(res.status, 500);
            assert_eq!(res.body["ok"], false);
        }
    }

    #[test]
    fn test_response_never_leaks_secret() {
        let res = verify_password(Some("hunter2"), br#"{"password":"wrong"}"#);
        assert!(!res.body.to_string().contains("hunter2"));
    }

    #[test]
    fn test_non_string_password_denied() {
        let res = verify_password(Some("hunter2"), br#"{"password":12345}"#);
        assert_eq!(res.status, 403);
    }
}
