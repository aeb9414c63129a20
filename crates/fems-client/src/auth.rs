//! Accounts facade: login, registration, logout and profile

use serde::Serialize;
use serde_json::{json, Value};

use fems_session::{Profile, SessionError};

use crate::client::{encode_payload, ApiClient, ApiResult};
use crate::expiry::SessionEnd;
use crate::interpreter::ApiFailure;
use crate::request::RequestDescriptor;

const LOGIN_PATH: &str = "/accounts/login/";
const REGISTER_PATH: &str = "/accounts/register/";
const PROFILE_PATH: &str = "/accounts/profile/";

#[derive(Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// On success the full response becomes the cached profile.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Value> {
        let body = json!({ "email": email, "password": password });
        let data = self
            .client
            .request(RequestDescriptor::post(LOGIN_PATH, body))
            .await?;
        self.establish_from(&data)?;
        Ok(data)
    }

    pub async fn register<T>(&self, payload: &T) -> ApiResult<Value>
    where
        T: Serialize + ?Sized,
    {
        let body = encode_payload(payload)?;
        let data = self
            .client
            .request(RequestDescriptor::post(REGISTER_PATH, body))
            .await?;
        self.establish_from(&data)?;
        Ok(data)
    }

    /// Clear the session and return to sign-in. Never touches the network.
    ///
    /// The clear itself is done by the session listeners.
    pub fn logout(&self) {
        tracing::info!("Logging out");
        self.client.end_session(SessionEnd::Logout);
    }

    pub async fn profile(&self) -> ApiResult<Value> {
        self.client
            .request(RequestDescriptor::get(PROFILE_PATH))
            .await
    }

    /// Update the profile; on success the submitted fields are merged into
    /// the cached profile of the session that sent the request. The token is
    /// left alone.
    pub async fn update_profile<T>(&self, payload: &T) -> ApiResult<Value>
    where
        T: Serialize + ?Sized,
    {
        let body = encode_payload(payload)?;
        let sent_with = self.client.session().token();
        let data = self
            .client
            .request(RequestDescriptor::put(PROFILE_PATH, body.clone()))
            .await?;

        let (Some(token), Some(fields)) = (sent_with, body.as_object()) else {
            return Ok(data);
        };
        match self
            .client
            .session()
            .update_user_for(&token, |profile| profile.merge(fields))
        {
            Ok(_) => {}
            // Logged out, or another user logged in, while the update was in flight
            Err(SessionError::NotAuthenticated | SessionError::SessionChanged) => {
                tracing::debug!("Session changed during profile update, cache not written");
            }
            Err(e) => tracing::warn!("Failed to cache updated profile: {}", e),
        }

        Ok(data)
    }

    fn establish_from(&self, data: &Value) -> ApiResult<()> {
        let Some(token) = data
            .get("token")
            .and_then(Value::as_str)
            .filter(|token| !token.trim().is_empty())
        else {
            tracing::warn!("Authentication response carried no token");
            return Ok(());
        };

        let profile = Profile::from_value(data.clone()).unwrap_or_default();
        self.client
            .session()
            .establish(token, profile)
            .map_err(|e| ApiFailure::local(format!("Could not save session: {}", e)))?;

        tracing::info!(user_type = ?data.get("user_type"), "Signed in");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{harness, logged_in};
    use crate::expiry::SIGN_IN_ROUTE;
    use crate::request::Method;
    use fems_session::SessionStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn login_response() -> Value {
        json!({
            "full_name": "Asha Rao",
            "username": "asha",
            "user_id": "0b6c7d1e-9a8f-4a34-8d2a-2b1c4d5e6f70",
            "user_type": "farmer",
            "phone": "9800000000",
            "email": "asha@example.com",
            "token": "eyJhbGciOiJIUzI1NiJ9.payload.sig",
            "message": "Login successful"
        })
    }

    #[tokio::test]
    async fn test_login_establishes_session() {
        let h = harness();
        h.transport
            .respond(Method::Post, "/accounts/login/", 200, login_response());

        let data = h
            .client
            .auth()
            .login("asha@example.com", "secret")
            .await
            .unwrap();

        let session = h.client.session();
        assert!(session.is_authenticated());
        assert_eq!(
            session.token().as_deref(),
            Some("eyJhbGciOiJIUzI1NiJ9.payload.sig")
        );
        assert_eq!(session.user().unwrap().into_value(), data);

        let sent = &h.transport.requests()[0];
        assert_eq!(sent.header("Authorization"), None);
        let body: Value = serde_json::from_slice(sent.body.as_ref().unwrap()).unwrap();
        assert_eq!(body, json!({"email": "asha@example.com", "password": "secret"}));
    }

    #[tokio::test]
    async fn test_failed_login_leaves_logged_out() {
        let h = harness();
        h.transport.respond(
            Method::Post,
            "/accounts/login/",
            400,
            json!({"message": "Invalid credentials"}),
        );

        let failure = h.client.auth().login("x@y.z", "bad").await.unwrap_err();
        assert_eq!(failure.message, "Invalid credentials");
        assert!(!h.client.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_inactive_account_403_redirects() {
        let h = harness();
        h.transport.respond(
            Method::Post,
            "/accounts/login/",
            403,
            json!({"message": "Account is not active. Please verify your account."}),
        );

        let failure = h.client.auth().login("x@y.z", "pw").await.unwrap_err();
        assert!(failure.is_unauthorized());
        assert_eq!(
            failure.message,
            "Account is not active. Please verify your account."
        );
        assert_eq!(h.navigation.current().as_deref(), Some(SIGN_IN_ROUTE));
    }

    #[tokio::test]
    async fn test_register_establishes_session() {
        let h = harness();
        h.transport.respond(
            Method::Post,
            "/accounts/register/",
            201,
            json!({"email": "new@example.com", "token": "t-1", "message": "Registration successful"}),
        );

        h.client
            .auth()
            .register(&json!({"email": "new@example.com", "password": "pw"}))
            .await
            .unwrap();

        assert_eq!(h.client.session().token().as_deref(), Some("t-1"));
        assert_eq!(
            h.client.session().user().unwrap().email(),
            Some("new@example.com")
        );
    }

    #[tokio::test]
    async fn test_register_validation_errors_carry_fields() {
        let h = harness();
        h.transport.respond(
            Method::Post,
            "/accounts/register/",
            400,
            json!({"email": ["user with this email already exists."]}),
        );

        let failure = h
            .client
            .auth()
            .register(&json!({"email": "dup@example.com"}))
            .await
            .unwrap_err();
        assert!(failure.field_errors().unwrap().contains_key("email"));
        assert!(!h.client.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_tokenless_success_does_not_authenticate() {
        let h = harness();
        h.transport.respond(
            Method::Post,
            "/accounts/login/",
            200,
            json!({"message": "ok", "token": ""}),
        );

        h.client.auth().login("a@b.c", "pw").await.unwrap();
        assert!(!h.client.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_clears_and_redirects() {
        let h = harness();
        logged_in(&h);

        h.client.auth().logout();
        h.client.auth().logout();

        assert!(!h.client.session().is_authenticated());
        assert_eq!(h.navigation.current().as_deref(), Some(SIGN_IN_ROUTE));
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_update_profile_merges_cache() {
        let h = harness();
        logged_in(&h);
        h.transport.respond(
            Method::Put,
            "/accounts/profile/",
            200,
            json!({"message": "Profile updated successfully", "data": {"full_name": "New"}}),
        );

        h.client
            .auth()
            .update_profile(&json!({"full_name": "New"}))
            .await
            .unwrap();

        let profile = h.client.session().user().unwrap();
        assert_eq!(profile.full_name(), Some("New"));
        assert_eq!(profile.email(), Some("a@b.c"));
        assert_eq!(h.client.session().token().as_deref(), Some("jwt-token"));
    }

    #[tokio::test]
    async fn test_logout_clears_every_handle_once() {
        let h = harness();
        logged_in(&h);
        let ends = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ends);
        h.client.subscribe(Arc::new(move |_: SessionEnd<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let other = SessionStore::open(h.database.clone()).unwrap();
        assert!(other.is_authenticated());

        h.client.auth().logout();

        assert_eq!(ends.load(Ordering::SeqCst), 1);
        assert!(!other.is_authenticated());
        assert_eq!(h.navigation.current().as_deref(), Some(SIGN_IN_ROUTE));
    }

    #[tokio::test]
    async fn test_update_profile_skips_other_users_session() {
        let h = harness();
        logged_in(&h);
        h.transport.respond(
            Method::Put,
            "/accounts/profile/",
            200,
            json!({"message": "Profile updated successfully"}),
        );
        h.transport
            .delay(Method::Put, "/accounts/profile/", Duration::from_millis(50));

        let auth = h.client.auth();
        let profile_update = json!({"full_name": "First User"});
        let update = auth.update_profile(&profile_update);
        let switch_user = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let session = h.client.session();
            session.clear_session().unwrap();
            session
                .establish(
                    "second-token",
                    Profile::from_value(json!({"email": "second@example.com"})).unwrap(),
                )
                .unwrap();
        };
        let (result, ()) = tokio::join!(update, switch_user);
        result.unwrap();

        let profile = h.client.session().user().unwrap();
        assert_eq!(profile.email(), Some("second@example.com"));
        assert_eq!(profile.full_name(), None);
        assert_eq!(h.client.session().token().as_deref(), Some("second-token"));
    }

    #[tokio::test]
    async fn test_profile_fetch() {
        let h = harness();
        logged_in(&h);
        h.transport.respond(
            Method::Get,
            "/accounts/profile/",
            200,
            json!({"email": "a@b.c", "full_name": "Asha"}),
        );

        let profile = h.client.auth().profile().await.unwrap();
        assert_eq!(profile["full_name"], json!("Asha"));
        assert_eq!(
            h.transport.requests()[0].header("Authorization"),
            Some("jwt-token")
        );
    }
}
