//! Request Gateway: the single point of entry for all backend HTTP calls.
//!
//! Every request goes through [`ApiClient`]. It attaches the bearer
//! credential from the [`Session`] passed in, parses 2xx bodies into JSON,
//! and turns every non-2xx response into a structured error carrying the
//! server-provided message. Session expiry surfaces as
//! [`ApiError::AuthExpired`] exactly once, for the caller's top-level
//! handler to act on; the gateway itself never redirects and never retries.

use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::ApiError;
use crate::session::Session;

/// Client-wide timeout for ordinary JSON round trips.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Extended timeout for the CV upload: the server runs embedding and
/// similarity search synchronously before answering.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(90);

/// Whether a request belongs to a sign-in/registration exchange. A 401 on
/// an `Auth` call means the submitted credentials are wrong and passes
/// through unchanged instead of being classified as session expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Api,
    /// The console itself has no sign-in commands yet; the classification
    /// rule still distinguishes them.
    #[allow(dead_code)]
    Auth,
}

pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn get_json(
        &self,
        session: &Session,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ApiError> {
        let builder = self.http.get(self.url(path)).query(query);
        self.execute(session, CallKind::Api, path, builder).await
    }

    pub async fn post_json(
        &self,
        session: &Session,
        path: &str,
        body: &Value,
    ) -> Result<Value, ApiError> {
        let builder = self.http.post(self.url(path)).json(body);
        self.execute(session, CallKind::Api, path, builder).await
    }

    pub async fn put_json(
        &self,
        session: &Session,
        path: &str,
        body: &Value,
    ) -> Result<Value, ApiError> {
        let builder = self.http.put(self.url(path)).json(body);
        self.execute(session, CallKind::Api, path, builder).await
    }

    pub async fn delete(&self, session: &Session, path: &str) -> Result<Value, ApiError> {
        let builder = self.http.delete(self.url(path));
        self.execute(session, CallKind::Api, path, builder).await
    }

    /// Multipart POST with a per-request timeout override; used for the CV
    /// upload, which is far slower than ordinary calls.
    pub async fn post_multipart(
        &self,
        session: &Session,
        path: &str,
        form: Form,
        timeout: Duration,
    ) -> Result<Value, ApiError> {
        let builder = self.http.post(self.url(path)).multipart(form).timeout(timeout);
        self.execute(session, CallKind::Api, path, builder).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(
        &self,
        session: &Session,
        kind: CallKind,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<Value, ApiError> {
        let builder = match &session.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            let body = response.bytes().await?;
            debug!(path, status = status.as_u16(), "request succeeded");
            if body.is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_slice(&body)?);
        }

        let body = response.text().await.unwrap_or_default();

        if is_session_expiry(status, kind, session.on_auth_screen) {
            warn!(path, "credential rejected outside an auth flow; session expired");
            return Err(ApiError::AuthExpired);
        }

        let message = error_message(status, &body);
        warn!(path, status = status.as_u16(), %message, "request failed");
        Err(ApiError::RequestFailed {
            status: status.as_u16(),
            message,
        })
    }
}

/// A 401 counts as session expiry only when the request is not itself a
/// sign-in/registration call and the client is not on an auth screen. Both
/// exceptions mean "your credentials are invalid" rather than "your session
/// ran out", and must not bounce the operator to the sign-in entry point.
fn is_session_expiry(status: StatusCode, kind: CallKind, on_auth_screen: bool) -> bool {
    status == StatusCode::UNAUTHORIZED && kind == CallKind::Api && !on_auth_screen
}

/// Extracts the most specific human-readable message from an error body:
/// the backend's `message` field, then `error.message`, then a bare string
/// `error`, then the raw body, then the canonical status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
        if let Some(message) = value.pointer("/error/message").and_then(Value::as_str) {
            return message.to_string();
        }
        if let Some(message) = value.get("error").and_then(Value::as_str) {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_401_is_session_expiry() {
        assert!(is_session_expiry(StatusCode::UNAUTHORIZED, CallKind::Api, false));
    }

    #[test]
    fn auth_call_401_passes_through() {
        assert!(!is_session_expiry(StatusCode::UNAUTHORIZED, CallKind::Auth, false));
    }

    #[test]
    fn on_auth_screen_401_passes_through() {
        assert!(!is_session_expiry(StatusCode::UNAUTHORIZED, CallKind::Api, true));
    }

    #[test]
    fn non_401_is_never_session_expiry() {
        assert!(!is_session_expiry(StatusCode::FORBIDDEN, CallKind::Api, false));
        assert!(!is_session_expiry(StatusCode::INTERNAL_SERVER_ERROR, CallKind::Api, false));
    }

    #[test]
    fn error_message_prefers_top_level_message() {
        let body = r#"{"message": "Job not found", "error": "ignored"}"#;
        assert_eq!(error_message(StatusCode::NOT_FOUND, body), "Job not found");
    }

    #[test]
    fn error_message_reads_nested_error_message() {
        let body = r#"{"error": {"code": "VALIDATION_ERROR", "message": "source is required"}}"#;
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, body),
            "source is required"
        );
    }

    #[test]
    fn error_message_reads_bare_error_string() {
        let body = r#"{"error": "scraper offline"}"#;
        assert_eq!(
            error_message(StatusCode::SERVICE_UNAVAILABLE, body),
            "scraper offline"
        );
    }

    #[test]
    fn error_message_falls_back_to_raw_body() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream hiccup"),
            "upstream hiccup"
        );
    }

    #[test]
    fn error_message_falls_back_to_status_reason() {
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, ""), "Bad Gateway");
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "  \n"), "Bad Gateway");
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = ApiClient::new("http://localhost:5000/api/v1/");
        assert_eq!(
            client.url("/admin/scraping/jobs"),
            "http://localhost:5000/api/v1/admin/scraping/jobs"
        );
    }
}
