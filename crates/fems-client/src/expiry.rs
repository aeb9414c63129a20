//! Session-end policy
//!
//! Any 401/403 anywhere, or an explicit logout, clears the session and
//! sends the user to sign-in. The interpreter only classifies; listeners
//! registered on `ApiClient` carry out the reaction.

use std::sync::Arc;

use tokio::sync::watch;

use fems_session::SessionStore;

use crate::interpreter::ApiFailure;

/// Entry point for signing in again.
pub const SIGN_IN_ROUTE: &str = "/auth/signin";

/// Why the session is ending.
#[derive(Debug, Clone, Copy)]
pub enum SessionEnd<'a> {
    Logout,
    Unauthorized(&'a ApiFailure),
}

pub trait SessionListener: Send + Sync {
    fn on_session_end(&self, event: SessionEnd<'_>);
}

impl<F> SessionListener for F
where
    F: Fn(SessionEnd<'_>) + Send + Sync,
{
    fn on_session_end(&self, event: SessionEnd<'_>) {
        self(event)
    }
}

/// Moves the UI to a route. Repeated calls with the same route must be safe.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Navigator that publishes the latest requested route.
///
/// A UI shell holds a receiver and follows changes; several redirects in a
/// row collapse into the last one.
#[derive(Debug, Clone)]
pub struct NavigationChannel {
    tx: Arc<watch::Sender<Option<String>>>,
}

impl NavigationChannel {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<String> {
        self.tx.borrow().clone()
    }
}

impl Default for NavigationChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for NavigationChannel {
    fn navigate(&self, route: &str) {
        self.tx.send_replace(Some(route.to_string()));
    }
}

/// Default listener: clear the session, then redirect to sign-in.
pub struct SessionExpiry {
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
}

impl SessionExpiry {
    pub fn new(session: SessionStore, navigator: Arc<dyn Navigator>) -> Self {
        Self { session, navigator }
    }
}

impl SessionListener for SessionExpiry {
    fn on_session_end(&self, event: SessionEnd<'_>) {
        match event {
            SessionEnd::Unauthorized(failure) => {
                tracing::warn!(status = ?failure.status, "Authorization rejected, ending session");
            }
            SessionEnd::Logout => tracing::info!("Logging out"),
        }

        // A second clear on an empty session is a no-op
        if let Err(e) = self.session.clear_session() {
            tracing::error!("Failed to persist cleared session: {}", e);
        }
        self.navigator.navigate(SIGN_IN_ROUTE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::FailureKind;
    use fems_session::Profile;
    use fems_storage::Database;
    use serde_json::json;

    fn unauthorized() -> ApiFailure {
        ApiFailure {
            kind: FailureKind::Unauthorized,
            status: Some(401),
            message: "Invalid token".to_string(),
            data: json!({"message": "Invalid token"}),
        }
    }

    #[test]
    fn test_expiry_clears_and_redirects() {
        let session = SessionStore::open(Database::open_in_memory().unwrap()).unwrap();
        session.establish("jwt", Profile::default()).unwrap();
        let navigation = NavigationChannel::new();
        let expiry = SessionExpiry::new(session.clone(), Arc::new(navigation.clone()));

        let failure = unauthorized();
        expiry.on_session_end(SessionEnd::Unauthorized(&failure));

        assert!(!session.is_authenticated());
        assert_eq!(navigation.current().as_deref(), Some(SIGN_IN_ROUTE));
    }

    #[test]
    fn test_repeated_expiry_is_harmless() {
        let session = SessionStore::open(Database::open_in_memory().unwrap()).unwrap();
        session.establish("jwt", Profile::default()).unwrap();
        let navigation = NavigationChannel::new();
        let mut rx = navigation.subscribe();
        let expiry = SessionExpiry::new(session.clone(), Arc::new(navigation.clone()));

        let failure = unauthorized();
        expiry.on_session_end(SessionEnd::Unauthorized(&failure));
        expiry.on_session_end(SessionEnd::Unauthorized(&failure));
        expiry.on_session_end(SessionEnd::Logout);

        assert!(!session.is_authenticated());
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_deref(), Some(SIGN_IN_ROUTE));
    }

    #[test]
    fn test_closures_are_listeners() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener = move |event: SessionEnd<'_>| {
            let label = match event {
                SessionEnd::Logout => "logout".to_string(),
                SessionEnd::Unauthorized(f) => format!("unauthorized:{:?}", f.status),
            };
            sink.lock().push(label);
        };

        let failure = unauthorized();
        listener.on_session_end(SessionEnd::Unauthorized(&failure));
        listener.on_session_end(SessionEnd::Logout);

        assert_eq!(
            *seen.lock(),
            vec!["unauthorized:Some(401)".to_string(), "logout".to_string()]
        );
    }
}
