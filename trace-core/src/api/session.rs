use serde::{Deserialize, Serialize};

/// Who is talking to the backend. Passed explicitly to every backend call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    username: Option<String>,
    token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn login(
        username: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            username: Some(username.into()),
            token: Some(token.into()),
        }
    }

    /// Drops the credentials, leaving an anonymous session.
    pub fn logout(&mut self) {
        self.username = None;
        self.token = None;
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Value for the `Authorization` header, if authenticated.
    pub fn bearer(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("Bearer {token}"))
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}
