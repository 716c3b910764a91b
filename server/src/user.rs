use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::BackendError;
use crate::normalization;
use crate::times::Times;

/// The role a user registered as.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    User,
    Admin,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::User => "user",
            UserType::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Result<Self, BackendError> {
        match value {
            "user" => Ok(UserType::User),
            "admin" => Ok(UserType::Admin),
            other => Err(BackendError::InvalidUserType(other.to_owned())),
        }
    }
}

impl Default for UserType {
    fn default() -> Self {
        UserType::User
    }
}

/// A single account. The stored credential hash is deliberately not a
/// field here; it never leaves the store layer except inside
/// [`StoredCredentials`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The ID of the user.
    #[serde(rename = "_id")]
    id: Uuid,

    /// The display name provided at registration.
    name: String,

    /// The email, case-folded. Unique across accounts.
    email: String,

    /// The phone number provided, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,

    /// The role registered as.
    user_type: UserType,

    /// Cumulative points. Only ever increased, by recording a drop.
    points: i64,

    /// Cumulative number of recorded drops.
    total_recycled: i64,

    /// Cumulative kilograms of CO₂ attributed.
    co2_saved: f64,

    /// Badges awarded so far. No duplicates.
    badges: Vec<String>,

    /// The times it was created and updated.
    #[serde(flatten)]
    times: Times,
}

impl User {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        name: String,
        email: String,
        phone: Option<String>,
        user_type: UserType,
        points: i64,
        total_recycled: i64,
        co2_saved: f64,
        badges: Vec<String>,
        times: Times,
    ) -> Self {
        User {
            id,
            name,
            email,
            phone,
            user_type,
            points,
            total_recycled,
            co2_saved,
            badges,
            times,
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn user_type(&self) -> UserType {
        self.user_type
    }

    pub fn points(&self) -> i64 {
        self.points
    }

    pub fn total_recycled(&self) -> i64 {
        self.total_recycled
    }

    pub fn badges(&self) -> &[String] {
        &self.badges
    }

    /// Returns a copy with one drop's rewards applied: the increments
    /// plus badge evaluation. The live store applies the same rules
    /// inside its transaction; this copy backs the in-memory store the
    /// tests run against.
    #[cfg(test)]
    pub(crate) fn with_rewards(&self, item: &crate::detection::SubmittedItem) -> User {
        use time::OffsetDateTime;

        use crate::rewards;

        let total_recycled = self.total_recycled + 1;
        let mut badges = self.badges.clone();

        if let Some(badge) = rewards::earned_badge(total_recycled, &badges) {
            badges.push(badge.to_owned());
        }

        User {
            points: self.points + item.points,
            total_recycled,
            co2_saved: self.co2_saved + item.co2_saved,
            badges,
            times: Times::new(self.times.created_at, OffsetDateTime::now_utc()),
            ..self.clone()
        }
    }
}

/// A stored credential hash alongside the account it belongs to.
#[derive(Clone, Debug)]
pub struct StoredCredentials {
    pub(crate) user: User,
    pub(crate) password_hash: String,
}

/// The fields the store needs to create an account. The credential
/// arrives here already hashed.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) phone: Option<String>,
    pub(crate) password_hash: String,
    pub(crate) user_type: UserType,
}

impl NewUser {
    pub fn new(registration: ValidRegistration, password_hash: String) -> Self {
        NewUser {
            name: registration.name,
            email: registration.email,
            phone: registration.phone,
            password_hash,
            user_type: registration.user_type,
        }
    }
}

/// A registration submission. Name, email, and password are required,
/// but they arrive optional so an absent field maps to the API's 400
/// rather than a deserialization failure.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    #[serde(default, deserialize_with = "normalization::deserialize_option")]
    pub(crate) name: Option<String>,

    #[serde(default, deserialize_with = "normalization::deserialize_email_option")]
    pub(crate) email: Option<String>,

    #[serde(default)]
    pub(crate) phone: Option<String>,

    #[serde(default)]
    pub(crate) password: Option<String>,

    #[serde(default)]
    pub(crate) user_type: Option<UserType>,
}

/// A registration that passed the required-field rule.
#[derive(Clone, Debug)]
pub struct ValidRegistration {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) phone: Option<String>,
    pub(crate) password: String,
    pub(crate) user_type: UserType,
}

impl RegistrationRequest {
    /// Applies the required-field rule: name, email, and password must
    /// all be present and non-blank. The role defaults to `user`.
    pub fn into_validated(self) -> Result<ValidRegistration, BackendError> {
        match (self.name, self.email, self.password) {
            (Some(name), Some(email), Some(password))
                if !name.is_empty() && !email.is_empty() && !password.is_empty() =>
            {
                Ok(ValidRegistration {
                    name,
                    email,
                    phone: self.phone,
                    password,
                    user_type: self.user_type.unwrap_or_default(),
                })
            }
            _ => Err(BackendError::MissingFields),
        }
    }
}

/// A login submission. All three fields are required.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "normalization::deserialize_email_option")]
    pub(crate) email: Option<String>,

    #[serde(default)]
    pub(crate) password: Option<String>,

    #[serde(default)]
    pub(crate) user_type: Option<UserType>,
}

/// A login that passed the required-field rule.
#[derive(Clone, Debug)]
pub struct LoginAttempt {
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) user_type: UserType,
}

impl LoginRequest {
    pub fn into_validated(self) -> Result<LoginAttempt, BackendError> {
        match (self.email, self.password, self.user_type) {
            (Some(email), Some(password), Some(user_type))
                if !email.is_empty() && !password.is_empty() =>
            {
                Ok(LoginAttempt {
                    email,
                    password,
                    user_type,
                })
            }
            _ => Err(BackendError::MissingFields),
        }
    }
}
