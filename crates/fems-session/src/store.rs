//! Session Store
//!
//! Single source of truth for "is there a usable credential". Storage is
//! authoritative: every read goes back to it, so handles opened on the same
//! database agree, and a session cleared through one handle is gone for all.
//! Token and profile are always written together in one storage transaction.

use parking_lot::Mutex;
use std::sync::Arc;

use fems_storage::Database;

use crate::error::SessionError;
use crate::session::{Profile, Session};
use crate::Result;

/// Storage key holding the raw token string.
pub(crate) const TOKEN_KEY: &str = "fems_token";
/// Storage key holding the JSON-serialized profile.
pub(crate) const USER_KEY: &str = "fems_user";

pub struct SessionStore {
    /// Last session read from storage. Also serializes writers on this handle
    cache: Arc<Mutex<Session>>,
    /// Durable storage
    db: Database,
}

impl SessionStore {
    /// Restore the persisted session, if any.
    pub fn open(db: Database) -> Result<Self> {
        let stored = Stored::read(&db)?;
        let session = stored.session();
        if session.is_authenticated() && stored.user.is_some() && session.profile().is_none() {
            tracing::warn!("Stored profile is malformed, treating it as absent");
        }

        tracing::info!(
            authenticated = session.is_authenticated(),
            has_profile = session.profile().is_some(),
            "Restored session"
        );

        Ok(Self {
            cache: Arc::new(Mutex::new(session)),
            db,
        })
    }

    pub fn snapshot(&self) -> Session {
        self.current()
    }

    pub fn token(&self) -> Option<String> {
        self.current().token().map(str::to_string)
    }

    pub fn user(&self) -> Option<Profile> {
        self.current().profile().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_authenticated()
    }

    /// Replace the token, keeping any stored profile.
    ///
    /// A blank token is treated as no credential and clears the session.
    pub fn set_token(&self, token: &str) -> Result<()> {
        if token.trim().is_empty() {
            tracing::warn!("Blank token written, clearing session instead");
            self.clear_session()?;
            return Ok(());
        }

        self.modify(|current| Ok(Session::logged_in(token, current.profile().cloned())))?;
        Ok(())
    }

    /// Overwrite the stored profile. Fails when nobody is logged in.
    pub fn set_user(&self, profile: Profile) -> Result<()> {
        self.update_user(|current| *current = profile.clone())
            .map(|_| ())
    }

    /// Read-modify-write of the stored profile.
    ///
    /// `f` may run more than once if another handle writes the session
    /// concurrently.
    pub fn update_user<F>(&self, f: F) -> Result<Profile>
    where
        F: FnMut(&mut Profile),
    {
        self.update_profile(None, f)
    }

    /// Like `update_user`, but only while `token` is still the stored token.
    ///
    /// Fails with `SessionChanged` if the user logged out or someone else
    /// logged in since `token` was read.
    pub fn update_user_for<F>(&self, token: &str, f: F) -> Result<Profile>
    where
        F: FnMut(&mut Profile),
    {
        self.update_profile(Some(token), f)
    }

    /// Write token and profile as one step, e.g. after login.
    pub fn establish(&self, token: &str, profile: Profile) -> Result<()> {
        if token.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }

        let next = Session::logged_in(token, Some(profile));
        self.modify(|_| Ok(next.clone()))?;

        tracing::info!("Session established");
        Ok(())
    }

    /// Drop token and profile. Returns whether a session was present.
    ///
    /// Safe to call repeatedly; the cached session is cleared even if the
    /// storage write fails.
    pub fn clear_session(&self) -> Result<bool> {
        let mut was_authenticated = false;
        let result = self.modify(|current| {
            was_authenticated = current.is_authenticated();
            Ok(Session::LoggedOut)
        });

        if let Err(e) = result {
            *self.cache.lock() = Session::LoggedOut;
            return Err(e);
        }
        if was_authenticated {
            tracing::info!("Session cleared");
        }
        Ok(was_authenticated)
    }

    /// Re-read storage, which other handles may have changed.
    fn current(&self) -> Session {
        let mut cache = self.cache.lock();
        match Stored::read(&self.db) {
            Ok(stored) => {
                *cache = stored.session();
                cache.clone()
            }
            Err(e) => {
                tracing::warn!("Could not read stored session, using cached copy: {}", e);
                cache.clone()
            }
        }
    }

    fn update_profile<F>(&self, expected_token: Option<&str>, mut f: F) -> Result<Profile>
    where
        F: FnMut(&mut Profile),
    {
        let next = self.modify(|current| {
            let Session::LoggedIn { token, profile } = current else {
                return Err(SessionError::NotAuthenticated);
            };
            if expected_token.is_some_and(|expected| expected != token.as_str()) {
                return Err(SessionError::SessionChanged);
            }

            let mut profile = profile.clone().unwrap_or_default();
            f(&mut profile);
            Ok(Session::LoggedIn {
                token: token.clone(),
                profile: Some(profile),
            })
        })?;

        Ok(next.profile().cloned().unwrap_or_default())
    }

    /// Derive the next session from what storage holds now and write it
    /// back, retrying if another handle changed storage in between.
    fn modify<F>(&self, mut f: F) -> Result<Session>
    where
        F: FnMut(&Session) -> Result<Session>,
    {
        let mut cache = self.cache.lock();
        loop {
            let stored = Stored::read(&self.db)?;
            let current = stored.session();
            *cache = current.clone();

            let next = f(&current)?;
            let encoded = Stored::encode(&next)?;
            if self.db.write_batch_if(&stored.entries(), &encoded.entries())? {
                *cache = next.clone();
                return Ok(next);
            }
            tracing::debug!("Stored session changed concurrently, retrying");
        }
    }
}

/// Raw stored form of a session, exactly as the two keys hold it.
struct Stored {
    token: Option<String>,
    user: Option<String>,
}

impl Stored {
    fn read(db: &Database) -> Result<Self> {
        let mut values = db.read_batch(&[TOKEN_KEY, USER_KEY])?.into_iter();
        Ok(Self {
            token: values.next().flatten(),
            user: values.next().flatten(),
        })
    }

    fn encode(session: &Session) -> Result<Self> {
        let user = match session.profile() {
            Some(profile) => Some(serde_json::to_string(profile)?),
            None => None,
        };
        Ok(Self {
            token: session.token().map(str::to_string),
            user,
        })
    }

    fn entries(&self) -> [(&str, Option<&str>); 2] {
        [
            (TOKEN_KEY, self.token.as_deref()),
            (USER_KEY, self.user.as_deref()),
        ]
    }

    /// A blank token means logged out; a malformed profile reads as absent.
    fn session(&self) -> Session {
        let Some(token) = self.token.as_deref().filter(|t| !t.trim().is_empty()) else {
            return Session::LoggedOut;
        };

        let profile = self.user.as_deref().and_then(|raw| {
            match serde_json::from_str::<serde_json::Value>(raw) {
                Ok(value) => Profile::from_value(value),
                Err(e) => {
                    tracing::debug!("Ignoring malformed stored profile: {}", e);
                    None
                }
            }
        });

        Session::LoggedIn {
            token: token.to_string(),
            profile,
        }
    }
}

impl Clone for SessionStore {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            db: self.db.clone(),
        }
    }
}
