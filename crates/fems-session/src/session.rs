//! Session data structures

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Last-known user profile, stored exactly as the backend returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile(Map<String, Value>);

impl Profile {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build a profile from a decoded JSON body. Only objects qualify.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn email(&self) -> Option<&str> {
        self.get_str("email")
    }

    pub fn full_name(&self) -> Option<&str> {
        self.get_str("full_name")
    }

    pub fn username(&self) -> Option<&str> {
        self.get_str("username")
    }

    pub fn user_type(&self) -> Option<&str> {
        self.get_str("user_type")
    }

    /// Overwrite fields with those in `update`, keeping everything else.
    pub fn merge(&mut self, update: &Map<String, Value>) {
        for (key, value) in update {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Client-side belief about authentication.
///
/// A profile can only exist alongside a token.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Session {
    #[default]
    LoggedOut,
    LoggedIn {
        token: String,
        profile: Option<Profile>,
    },
}

impl Session {
    /// Empty or whitespace tokens count as no credential at all.
    pub fn logged_in(token: impl Into<String>, profile: Option<Profile>) -> Self {
        let token = token.into();
        if token.trim().is_empty() {
            Session::LoggedOut
        } else {
            Session::LoggedIn { token, profile }
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Session::LoggedIn { token, .. } => Some(token),
            Session::LoggedOut => None,
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            Session::LoggedIn { profile, .. } => profile.as_ref(),
            Session::LoggedOut => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::LoggedIn { .. })
    }
}
