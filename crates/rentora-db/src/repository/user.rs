//! SurrealDB implementation of [`UserRepository`].
//!
//! Password hashing uses Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1). Salt is randomly
//! generated per hash. An optional pepper (server-side secret) can be
//! provided at construction time.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::{DateTime, Utc};
use rentora_core::error::RentoraResult;
use rentora_core::models::user::{CreateUser, RegistrationType, UpdateUser, User, UserRole};
use rentora_core::repository::{PaginatedResult, Pagination, UserRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::CountRow;
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    subject_id: Option<String>,
    email: String,
    name: String,
    surname: String,
    password_hash: Option<String>,
    phone: Option<String>,
    role: String,
    registration_type: String,
    two_factor_enabled: bool,
    two_factor_secret: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    subject_id: Option<String>,
    email: String,
    name: String,
    surname: String,
    password_hash: Option<String>,
    phone: Option<String>,
    role: String,
    registration_type: String,
    two_factor_enabled: bool,
    two_factor_secret: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_role(s: &str) -> Result<UserRole, DbError> {
    match s {
        "tenant" => Ok(UserRole::Tenant),
        "landlord" => Ok(UserRole::Landlord),
        "admin" => Ok(UserRole::Admin),
        "service_provider" => Ok(UserRole::ServiceProvider),
        other => Err(DbError::Migration(format!("unknown user role: {other}"))),
    }
}

fn parse_registration_type(s: &str) -> Result<RegistrationType, DbError> {
    match s {
        "GOOGLE" => Ok(RegistrationType::Google),
        "FACEBOOK" => Ok(RegistrationType::Facebook),
        "APPLE" => Ok(RegistrationType::Apple),
        "EMAIL" => Ok(RegistrationType::Email),
        other => Err(DbError::Migration(format!(
            "unknown registration type: {other}"
        ))),
    }
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            subject_id: self.subject_id,
            email: self.email,
            name: self.name,
            surname: self.surname,
            password_hash: self.password_hash,
            phone: self.phone,
            role: parse_role(&self.role)?,
            registration_type: parse_registration_type(&self.registration_type)?,
            two_factor_enabled: self.two_factor_enabled,
            two_factor_secret: self.two_factor_secret,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(User {
            id,
            subject_id: self.subject_id,
            email: self.email,
            name: self.name,
            surname: self.surname,
            password_hash: self.password_hash,
            phone: self.phone,
            role: parse_role(&self.role)?,
            registration_type: parse_registration_type(&self.registration_type)?,
            two_factor_enabled: self.two_factor_enabled,
            two_factor_secret: self.two_factor_secret,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Hash a password with Argon2id using OWASP-recommended parameters.
///
/// If a pepper is provided, it is prepended to the password before
/// hashing. The salt is randomly generated for each call.
fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Migration(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input, &salt)
        .map_err(|e| DbError::Migration(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> RentoraResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let password_hash = match &input.password {
            Some(raw) => Some(hash_password(raw, self.pepper.as_deref())?),
            None => None,
        };

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 subject_id = $subject_id, \
                 email = $email, \
                 name = $name, surname = $surname, \
                 password_hash = $password_hash, \
                 phone = $phone, \
                 role = $role, \
                 registration_type = $registration_type, \
                 two_factor_enabled = false, \
                 two_factor_secret = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("subject_id", input.subject_id))
            .bind(("email", input.email))
            .bind(("name", input.name))
            .bind(("surname", input.surname))
            .bind(("password_hash", password_hash))
            .bind(("phone", input.phone))
            .bind(("role", input.role.as_str().to_string()))
            .bind((
                "registration_type",
                input.registration_type.as_str().to_string(),
            ))
            .await
            .map_err(|e| DbError::from_write("user", e))?;

        let mut result = result.check().map_err(|e| DbError::from_write("user", e))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> RentoraResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_subject_id(&self, subject_id: &str) -> RentoraResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE subject_id = $subject_id",
            )
            .bind(("subject_id", subject_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("subject_id={subject_id}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn get_by_email(&self, email: &str) -> RentoraResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE email = $email",
            )
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> RentoraResult<User> {
        let id_str = id.to_string();

        let password_hash = match &input.password {
            Some(Some(raw)) => Some(Some(hash_password(raw, self.pepper.as_deref())?)),
            Some(None) => Some(None),
            None => None,
        };

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.surname.is_some() {
            sets.push("surname = $surname");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        if input.role.is_some() {
            sets.push("role = $role");
        }
        if password_hash.is_some() {
            sets.push("password_hash = $password_hash");
        }
        if input.two_factor_enabled.is_some() {
            sets.push("two_factor_enabled = $two_factor_enabled");
        }
        if input.two_factor_secret.is_some() {
            sets.push("two_factor_secret = $two_factor_secret");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('user', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(surname) = input.surname {
            builder = builder.bind(("surname", surname));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(phone) = input.phone {
            // phone is Option<Option<String>>: Some(Some(v)) = set, Some(None) = clear
            builder = builder.bind(("phone", phone));
        }
        if let Some(ref role) = input.role {
            builder = builder.bind(("role", role.as_str().to_string()));
        }
        if let Some(password_hash) = password_hash {
            builder = builder.bind(("password_hash", password_hash));
        }
        if let Some(two_factor_enabled) = input.two_factor_enabled {
            builder = builder.bind(("two_factor_enabled", two_factor_enabled));
        }
        if let Some(two_factor_secret) = input.two_factor_secret {
            builder = builder.bind(("two_factor_secret", two_factor_secret));
        }

        let result = builder.await.map_err(|e| DbError::from_write("user", e))?;
        let mut result = result.check().map_err(|e| DbError::from_write("user", e))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn delete(&self, id: Uuid) -> RentoraResult<()> {
        self.db
            .query("DELETE type::record('user', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> RentoraResult<PaginatedResult<User>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM user GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn count(&self) -> RentoraResult<u64> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM user GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
