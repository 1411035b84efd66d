use crate::client::RedditApi;

/// Outcome of the startup identity check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthStatus {
    Authenticated(String),
    Failed(String),
}

impl AuthStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthStatus::Authenticated(_))
    }
}

/// One identity round trip. Failure is logged and returned, never raised:
/// the run carries on and later calls fail on their own.
pub fn authenticate<A: RedditApi + ?Sized>(api: &A) -> AuthStatus {
    match api.me() {
        Ok(Some(name)) => {
            tracing::info!("Authenticated as: {}", name);
            AuthStatus::Authenticated(name)
        }
        Ok(None) => {
            tracing::warn!("Authentication failed. Please check your credentials.");
            AuthStatus::Failed("identity endpoint returned no user".to_string())
        }
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), "Authentication check errored");
            AuthStatus::Failed(format!("{:#}", e))
        }
    }
}
