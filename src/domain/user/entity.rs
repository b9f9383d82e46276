//! User entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored user account
///
/// `password` holds the bcrypt hash and is only populated when the record was
/// read with the credential projection. It is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Storage-assigned identifier, opaque to the service
    #[serde(rename = "_id")]
    id: String,
    username: String,
    #[serde(skip_serializing, default)]
    password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Create a user record from a candidate whose password is already hashed
    pub fn new(id: impl Into<String>, candidate: NewUser) -> Self {
        Self {
            id: id.into(),
            username: candidate.username,
            password: Some(candidate.password),
            first_name: candidate.first_name,
            last_name: candidate.last_name,
            last_login: None,
        }
    }

    /// Rebuild a record from its stored parts
    pub fn from_parts(
        id: impl Into<String>,
        username: impl Into<String>,
        password: Option<String>,
        first_name: Option<String>,
        last_name: Option<String>,
        last_login: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            password,
            first_name,
            last_name,
            last_login,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The stored password hash, if this record was read with credentials
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    pub fn last_login(&self) -> Option<DateTime<Utc>> {
        self.last_login
    }

    /// Drop the password hash from this record
    pub fn without_credential(mut self) -> Self {
        self.password = None;
        self
    }

    /// Merge the fields present in `patch`, leaving the others untouched
    pub fn apply(&mut self, patch: &UserPatch) {
        if let Some(password) = &patch.password {
            self.password = Some(password.clone());
        }
        if let Some(first_name) = &patch.first_name {
            self.first_name = first_name.clone();
        }
        if let Some(last_name) = &patch.last_name {
            self.last_name = last_name.clone();
        }
        if let Some(last_login) = patch.last_login {
            self.last_login = Some(last_login);
        }
    }
}

/// Candidate for a new user. `password` is plaintext until the service hashes it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl NewUser {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            first_name: None,
            last_name: None,
        }
    }

    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }
}

/// Partial update for a user
///
/// There is deliberately no `username` field: identity cannot be changed
/// through an update. A `password` here is plaintext on the way into the
/// service and a hash on the way into the store.
///
/// Names are nullable: `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub password: Option<String>,
    pub first_name: Option<Option<String>>,
    pub last_name: Option<Option<String>>,
    pub last_login: Option<DateTime<Utc>>,
}

impl UserPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(Some(first_name.into()));
        self
    }

    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(Some(last_name.into()));
        self
    }

    pub fn clear_first_name(mut self) -> Self {
        self.first_name = Some(None);
        self
    }

    pub fn clear_last_name(mut self) -> Self {
        self.last_name = Some(None);
        self
    }

    pub fn with_last_login(mut self, last_login: DateTime<Utc>) -> Self {
        self.last_login = Some(last_login);
        self
    }

    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.password.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.last_login.is_none()
    }
}

/// Record selection used by bulk reads, updates and deletes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    /// Every record in the collection
    All,
    /// Records whose username is in the set
    Usernames(Vec<String>),
}

impl UserFilter {
    pub fn usernames<I, S>(usernames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Usernames(usernames.into_iter().map(Into::into).collect())
    }

    /// Whether `user` is selected by this filter
    pub fn matches(&self, user: &User) -> bool {
        match self {
            Self::All => true,
            Self::Usernames(names) => names.iter().any(|n| n == user.username()),
        }
    }
}
