use thiserror::Error;

/// Application-level error type shared by the gateway, the match retrieval
/// service, and the moderation store.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The session credential was rejected outside an auth flow. Only the
    /// top-level handler recovers this, by clearing the session and sending
    /// the operator back to sign-in.
    #[error("session expired; sign in again")]
    AuthExpired,

    /// Client-side fast-reject of a CV document before any network call.
    #[error("invalid CV file: {0}")]
    InvalidFile(String),

    /// A bulk operation was requested with no job ids selected.
    #[error("no jobs selected")]
    EmptySelection,

    /// Any non-2xx response the gateway did not classify as session expiry.
    #[error("request failed (status {status}): {message}")]
    RequestFailed { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The server answered 2xx with something that is not a JSON object
    /// where one is required.
    #[error("malformed response payload: {0}")]
    MalformedPayload(String),
}
