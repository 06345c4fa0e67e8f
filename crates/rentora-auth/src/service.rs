//! Authentication service — identity sync, password login, and
//! two-factor orchestration.

use std::sync::Arc;

use rentora_core::error::{RentoraError, RentoraResult};
use rentora_core::models::user::{CreateUser, RegistrationType, UpdateUser, User, UserRole};
use rentora_core::repository::UserRepository;
use tracing::{debug, info};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::identity::{IdentityProvider, VerifiedIdentity};
use crate::password;
use crate::token;
use crate::totp;
use crate::totp::TotpEnrollment;

/// Result of a successful sync, login, or registration: the local user
/// plus a freshly issued session token.
#[derive(Debug)]
pub struct SyncOutput {
    pub user: User,
    pub token: String,
}

/// Input for password registration.
#[derive(Debug)]
pub struct RegisterInput {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub password: String,
}

/// Authentication service.
///
/// Generic over the user repository so that the auth layer has no
/// dependency on the database crate; the identity provider is held as
/// a trait object so the HTTP layer and tests can swap it.
#[derive(Clone)]
pub struct AuthService<U: UserRepository> {
    user_repo: U,
    provider: Arc<dyn IdentityProvider>,
    config: AuthConfig,
}

impl<U: UserRepository> AuthService<U> {
    pub fn new(user_repo: U, provider: Arc<dyn IdentityProvider>, config: AuthConfig) -> Self {
        Self {
            user_repo,
            provider,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Verify an external ID token and reconcile it with local storage.
    ///
    /// This is the gate-side entry point: it performs verification and
    /// find-or-create but does not issue a session token.
    pub async fn authenticate_external(&self, id_token: &str) -> RentoraResult<User> {
        // 1. Verify against the identity provider. No local state is
        //    touched if this fails.
        let identity = self.provider.verify_id_token(id_token).await?;

        // 2. Find-or-create by subject id.
        self.find_or_create(&identity, RegistrationType::Google)
            .await
    }

    /// Full sync flow: verify, find-or-create, issue a session token.
    pub async fn sync_identity(
        &self,
        id_token: &str,
        registration_type: RegistrationType,
    ) -> RentoraResult<SyncOutput> {
        let identity = self.provider.verify_id_token(id_token).await?;
        let user = self.find_or_create(&identity, registration_type).await?;
        let token = token::issue_session_token(user.id, &self.config)?;
        Ok(SyncOutput { user, token })
    }

    /// Idempotent find-or-create keyed on the provider subject id.
    ///
    /// Existing records are returned unchanged — no profile overwrite.
    /// Concurrent first-time requests may race; the unique index on
    /// subject id is the backstop, and the loser of the race re-reads.
    async fn find_or_create(
        &self,
        identity: &VerifiedIdentity,
        registration_type: RegistrationType,
    ) -> RentoraResult<User> {
        match self.user_repo.get_by_subject_id(&identity.subject_id).await {
            Ok(user) => {
                debug!(subject_id = %identity.subject_id, user_id = %user.id, "known subject");
                return Ok(user);
            }
            Err(RentoraError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let create = CreateUser {
            subject_id: Some(identity.subject_id.clone()),
            email: identity
                .email
                .clone()
                .unwrap_or_else(|| self.config.fallback_email.clone()),
            name: identity.name.clone().unwrap_or_default(),
            surname: String::new(),
            password: None,
            phone: None,
            role: UserRole::Tenant,
            registration_type,
        };

        match self.user_repo.create(create).await {
            Ok(user) => {
                info!(subject_id = %identity.subject_id, user_id = %user.id, "created user from federated identity");
                Ok(user)
            }
            // Lost a concurrent first-sync race: the unique index
            // rejected the duplicate, the winner's row is authoritative.
            Err(RentoraError::AlreadyExists { .. }) => {
                self.user_repo.get_by_subject_id(&identity.subject_id).await
            }
            Err(e) => Err(e),
        }
    }

    /// Register a password-based account and issue a session token.
    pub async fn register(&self, input: RegisterInput) -> RentoraResult<SyncOutput> {
        let user = self
            .user_repo
            .create(CreateUser {
                subject_id: None,
                email: input.email,
                name: input.name,
                surname: input.surname,
                password: Some(input.password),
                phone: input.phone,
                role: input.role,
                registration_type: RegistrationType::Email,
            })
            .await?;

        let token = token::issue_session_token(user.id, &self.config)?;
        Ok(SyncOutput { user, token })
    }

    /// Authenticate with email + password and issue a session token.
    ///
    /// Failures are uniform `InvalidCredentials` — no user-existence
    /// oracle.
    pub async fn login(&self, email: &str, password_input: &str) -> RentoraResult<SyncOutput> {
        let user = self
            .user_repo
            .get_by_email(email)
            .await
            .map_err(|_| AuthError::InvalidCredentials)?;

        let hash = user
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;

        let valid = password::verify_password(password_input, hash, self.config.pepper.as_deref())
            .map_err(|e| RentoraError::Crypto(e.to_string()))?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = token::issue_session_token(user.id, &self.config)?;
        Ok(SyncOutput { user, token })
    }

    /// Validate a locally issued session token and load its user.
    pub async fn authenticate_session(&self, session_token: &str) -> RentoraResult<User> {
        let claims = token::decode_session_token(session_token, &self.config)?;
        let user_id = claims.user_id()?;
        self.user_repo.get_by_id(user_id).await
    }

    // -- Two-factor -----------------------------------------------------

    /// Begin enrollment: generate a secret and QR code. Nothing is
    /// persisted until [`enable_two_factor`](Self::enable_two_factor).
    pub fn init_two_factor(&self, email: &str) -> RentoraResult<TotpEnrollment> {
        Ok(totp::generate_enrollment(&self.config.totp_issuer, email)?)
    }

    /// Persist a caller-confirmed secret and mark two-factor enabled.
    pub async fn enable_two_factor(&self, email: &str, secret: &str) -> RentoraResult<User> {
        let user = self.user_repo.get_by_email(email).await?;
        self.user_repo
            .update(
                user.id,
                UpdateUser {
                    two_factor_enabled: Some(true),
                    two_factor_secret: Some(Some(secret.to_string())),
                    ..Default::default()
                },
            )
            .await
    }

    /// Check a one-time code against the account's stored secret.
    pub async fn verify_two_factor(&self, email: &str, code: &str) -> RentoraResult<bool> {
        let user = self.user_repo.get_by_email(email).await?;
        let secret = user
            .two_factor_secret
            .as_deref()
            .filter(|_| user.two_factor_enabled)
            .ok_or(AuthError::OtpNotEnrolled)?;

        Ok(totp::verify_code(
            secret,
            code,
            &self.config.totp_issuer,
            &user.email,
        )?)
    }

    /// Check a one-time code for an already-loaded user (the OTP gate).
    pub fn verify_code_for(&self, user: &User, code: &str) -> RentoraResult<bool> {
        let secret = user
            .two_factor_secret
            .as_deref()
            .filter(|_| user.two_factor_enabled)
            .ok_or(AuthError::OtpNotEnrolled)?;

        Ok(totp::verify_code(
            secret,
            code,
            &self.config.totp_issuer,
            &user.email,
        )?)
    }
}
