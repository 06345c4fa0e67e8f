//! External identity provider verification.
//!
//! The provider boundary is an object-safe trait so that the HTTP
//! layer can hold an `Arc<dyn IdentityProvider>` and tests can
//! substitute a static provider. The production implementation
//! verifies RS256 ID tokens against the provider's published JWKS.

use std::collections::HashMap;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::error::AuthError;

/// Claims extracted from a successfully verified external token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Stable subject identifier issued by the provider.
    pub subject_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Verification capability of the external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a raw ID token and return its identity claims.
    ///
    /// Fails with [`AuthError::TokenInvalid`] / [`AuthError::TokenExpired`]
    /// on bad signature, wrong audience/issuer, or expiry.
    async fn verify_id_token(&self, token: &str) -> Result<VerifiedIdentity, AuthError>;
}

/// Claim set of a federated ID token.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    email: Option<String>,
    name: Option<String>,
}

/// One key of the provider's JWKS document (RSA components,
/// base64url-encoded).
#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Clone, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

/// JWKS endpoint for Google-issued federated ID tokens.
pub const GOOGLE_SECURETOKEN_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Production identity provider: verifies RS256 ID tokens against the
/// provider's JWKS.
///
/// The key set is fetched lazily and cached; a token referencing an
/// unknown `kid` triggers one refetch (key rotation) before failing.
pub struct FederatedVerifier {
    /// Expected audience (the provider-side project id).
    project_id: String,
    /// Expected issuer.
    issuer: String,
    jwks_url: String,
    http: reqwest::Client,
    keys: RwLock<Option<JwkSet>>,
}

impl FederatedVerifier {
    pub fn new(project_id: impl Into<String>) -> Self {
        let project_id = project_id.into();
        Self {
            issuer: format!("https://securetoken.google.com/{project_id}"),
            project_id,
            jwks_url: GOOGLE_SECURETOKEN_JWKS_URL.into(),
            http: reqwest::Client::new(),
            keys: RwLock::new(None),
        }
    }

    /// Override the JWKS endpoint (non-default providers, testing).
    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = url.into();
        self
    }

    async fn fetch_keys(&self) -> Result<JwkSet, AuthError> {
        let resp = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::Crypto(format!("JWKS fetch: {e}")))?;

        if !resp.status().is_success() {
            return Err(AuthError::Crypto(format!(
                "JWKS fetch: HTTP {}",
                resp.status()
            )));
        }

        resp.json::<JwkSet>()
            .await
            .map_err(|e| AuthError::Crypto(format!("JWKS parse: {e}")))
    }

    /// Look up the key for `kid`, refetching once on a cache miss.
    async fn key_for(&self, kid: &str) -> Result<Jwk, AuthError> {
        {
            let cached = self.keys.read().await;
            if let Some(set) = cached.as_ref() {
                if let Some(key) = set.keys.iter().find(|k| k.kid == kid) {
                    return Ok(key.clone());
                }
            }
        }

        let fresh = self.fetch_keys().await?;
        let found = fresh.keys.iter().find(|k| k.kid == kid).cloned();

        {
            let mut cached = self.keys.write().await;
            *cached = Some(fresh);
        }

        found.ok_or_else(|| AuthError::TokenInvalid(format!("unknown signing key: {kid}")))
    }
}

#[async_trait]
impl IdentityProvider for FederatedVerifier {
    async fn verify_id_token(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| AuthError::TokenInvalid(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| AuthError::TokenInvalid("token header has no kid".into()))?;

        let jwk = self.key_for(&kid).await?;
        let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| AuthError::Crypto(format!("bad JWKS key: {e}")))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "aud", "iss"]);

        let data = jsonwebtoken::decode::<IdTokenClaims>(token, &key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid(e.to_string()),
            }
        })?;

        Ok(VerifiedIdentity {
            subject_id: data.claims.sub,
            email: data.claims.email,
            name: data.claims.name,
        })
    }
}

/// Static in-memory provider for tests and local development: maps
/// literal tokens to identities, everything else is invalid.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    identities: HashMap<String, VerifiedIdentity>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(mut self, token: impl Into<String>, identity: VerifiedIdentity) -> Self {
        self.identities.insert(token.into(), identity);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn verify_id_token(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        self.identities
            .get(token)
            .cloned()
            .ok_or_else(|| AuthError::TokenInvalid("unrecognized id token".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_provider_resolves_known_token() {
        let provider = StaticIdentityProvider::new().with_identity(
            "tok-1",
            VerifiedIdentity {
                subject_id: "uid_1".into(),
                email: Some("a@b.com".into()),
                name: None,
            },
        );

        let identity = provider.verify_id_token("tok-1").await.unwrap();
        assert_eq!(identity.subject_id, "uid_1");
        assert_eq!(identity.email.as_deref(), Some("a@b.com"));
    }

    #[tokio::test]
    async fn static_provider_rejects_unknown_token() {
        let provider = StaticIdentityProvider::new();
        assert!(matches!(
            provider.verify_id_token("nope").await,
            Err(AuthError::TokenInvalid(_))
        ));
    }

    #[test]
    fn verifier_derives_issuer_from_project() {
        let v = FederatedVerifier::new("demo-project");
        assert_eq!(v.issuer, "https://securetoken.google.com/demo-project");
        assert_eq!(v.project_id, "demo-project");
    }
}
