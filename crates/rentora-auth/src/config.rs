//! Authentication configuration.

/// Configuration for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Process-wide secret for HS256 session-token signing.
    pub jwt_secret: String,
    /// Session token lifetime in seconds (default: 604_800 = 7 days).
    pub session_lifetime_secs: u64,
    /// Issuer name shown in authenticator apps.
    pub totp_issuer: String,
    /// Optional pepper prepended to passwords before Argon2id hashing
    /// and verification.
    pub pepper: Option<String>,
    /// 256-bit AES-GCM key for encrypting stored secrets (SMTP
    /// credentials). `None` disables secret storage.
    pub secret_encryption_key: Option<[u8; 32]>,
    /// Sentinel email used when the identity provider supplies none.
    pub fallback_email: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            session_lifetime_secs: 604_800,
            totp_issuer: "Rentora".into(),
            pepper: None,
            secret_encryption_key: None,
            fallback_email: "unknown@rentora.local".into(),
        }
    }
}
