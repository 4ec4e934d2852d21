use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use tracing::warn;

/// Source of the bearer credential for remote-store calls.
pub trait AuthProvider: Send + Sync {
    /// Current credential, or `None` when the user is signed out.
    fn get_token(&self) -> Option<String>;

    /// Called when the store rejects the credential or none is available.
    /// Implementations send the user back through sign-in.
    fn on_unauthenticated(&self);
}

/// Credential fixed at start-up (from configuration). Forgets it once the
/// store rejects it, so later calls fail fast instead of retrying a dead token.
#[derive(Debug, Default)]
pub struct StaticTokenProvider {
    token: RwLock<Option<String>>,
    rejected: AtomicBool,
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        let token = token.filter(|t| !t.trim().is_empty());
        Self {
            token: RwLock::new(token),
            rejected: AtomicBool::new(false),
        }
    }

    /// True once `on_unauthenticated` has fired.
    pub fn was_rejected(&self) -> bool {
        self.rejected.load(Ordering::Acquire)
    }
}

impl AuthProvider for StaticTokenProvider {
    fn get_token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn on_unauthenticated(&self) {
        self.rejected.store(true, Ordering::Release);
        if let Ok(mut token) = self.token.write() {
            *token = None;
        }
        warn!("Not signed in; set REZOOM_TOKEN to a valid credential and retry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_token_is_absent() {
        assert_eq!(StaticTokenProvider::new(Some("  ".into())).get_token(), None);
        assert_eq!(StaticTokenProvider::new(None).get_token(), None);
    }

    #[test]
    fn test_rejection_clears_token() {
        let auth = StaticTokenProvider::new(Some("abc".into()));
        assert_eq!(auth.get_token().as_deref(), Some("abc"));
        auth.on_unauthenticated();
        assert!(auth.was_rejected());
        assert_eq!(auth.get_token(), None);
    }
}
