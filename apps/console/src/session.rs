/// Explicit session context read by the gateway once per call.
///
/// There is no ambient credential storage: whoever drives the core builds a
/// `Session` and passes it into every request.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Bearer credential attached to outgoing requests when present.
    pub token: Option<String>,
    /// True while the client sits on a sign-in/registration screen. A 401
    /// received there means the submitted credentials are wrong, not that a
    /// session expired, and must not trigger the expiry path.
    pub on_auth_screen: bool,
}

impl Session {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            on_auth_screen: false,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Drops the credential after the gateway reports expiry.
    pub fn clear(&mut self) {
        self.token = None;
    }
}
