//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Application-level role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Tenant,
    Landlord,
    Admin,
    ServiceProvider,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tenant => "tenant",
            Self::Landlord => "landlord",
            Self::Admin => "admin",
            Self::ServiceProvider => "service_provider",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the account was first registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationType {
    Google,
    Facebook,
    Apple,
    Email,
}

impl RegistrationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "GOOGLE",
            Self::Facebook => "FACEBOOK",
            Self::Apple => "APPLE",
            Self::Email => "EMAIL",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Stable identifier issued by the external identity provider.
    /// Absent for accounts registered with a password.
    pub subject_id: Option<String>,
    pub email: String,
    pub name: String,
    pub surname: String,
    /// Argon2id PHC hash. Absent for federated-only accounts.
    pub password_hash: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub registration_type: RegistrationType,
    pub two_factor_enabled: bool,
    /// Base32 TOTP secret, present once two-factor is pending or enabled.
    pub two_factor_secret: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub subject_id: Option<String>,
    pub email: String,
    pub name: String,
    pub surname: String,
    /// Raw password (hashed with Argon2id before storage). Absent for
    /// federated accounts.
    pub password: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub registration_type: RegistrationType,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub role: Option<UserRole>,
    /// Raw password to re-hash. `Some(None)` clears the stored hash.
    pub password: Option<Option<String>>,
    pub two_factor_enabled: Option<bool>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub two_factor_secret: Option<Option<String>>,
}
