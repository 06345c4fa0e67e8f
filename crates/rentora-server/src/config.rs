//! Server configuration, loaded from the environment at startup.

use rentora_auth::AuthConfig;
use rentora_db::DbConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    pub db: DbConfig,
    /// Process-wide HS256 secret for session tokens.
    pub jwt_secret: String,
    /// Identity-provider project id (expected token audience).
    pub federated_project_id: String,
    /// Optional pepper for password hashing.
    pub pepper: Option<String>,
    /// 256-bit key for encrypting stored secrets, hex-encoded in the
    /// environment.
    pub secret_encryption_key: Option<[u8; 32]>,
}

fn env_or(var: &'static str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    std::env::var(var).map_err(|_| ConfigError::Missing(var))
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// `JWT_SECRET` and `FEDERATED_PROJECT_ID` are required; database
    /// settings fall back to local defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env_or("RENTORA_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::Invalid {
                var: "RENTORA_PORT",
                reason: e.to_string(),
            })?;

        let db = DbConfig {
            url: env_or("SURREAL_URL", "127.0.0.1:8000"),
            namespace: env_or("SURREAL_NAMESPACE", "rentora"),
            database: env_or("SURREAL_DATABASE", "main"),
            username: env_or("SURREAL_USERNAME", "root"),
            password: env_or("SURREAL_PASSWORD", "root"),
        };

        let secret_encryption_key = match std::env::var("SMTP_SECRET_KEY") {
            Ok(hex) => Some(parse_key_hex(&hex)?),
            Err(_) => None,
        };

        Ok(Self {
            port,
            db,
            jwt_secret: required("JWT_SECRET")?,
            federated_project_id: required("FEDERATED_PROJECT_ID")?,
            pepper: std::env::var("AUTH_PEPPER").ok(),
            secret_encryption_key,
        })
    }

    /// Derive the auth-layer configuration.
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            jwt_secret: self.jwt_secret.clone(),
            pepper: self.pepper.clone(),
            secret_encryption_key: self.secret_encryption_key,
            ..AuthConfig::default()
        }
    }
}

/// Decode a 64-character hex string into a 32-byte key.
fn parse_key_hex(hex_str: &str) -> Result<[u8; 32], ConfigError> {
    let bytes = hex::decode(hex_str.trim()).map_err(|e| ConfigError::Invalid {
        var: "SMTP_SECRET_KEY",
        reason: e.to_string(),
    })?;

    let len = bytes.len();
    bytes.try_into().map_err(|_| ConfigError::Invalid {
        var: "SMTP_SECRET_KEY",
        reason: format!("must be exactly 64 hex chars (32 bytes), got {len} bytes"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_hex_roundtrip() {
        let key = parse_key_hex(&"ab".repeat(32)).unwrap();
        assert_eq!(key, [0xab; 32]);
    }

    #[test]
    fn key_hex_wrong_length_fails() {
        assert!(parse_key_hex("abcd").is_err());
    }

    #[test]
    fn key_hex_invalid_chars_fail() {
        assert!(parse_key_hex(&"zz".repeat(32)).is_err());
    }
}
