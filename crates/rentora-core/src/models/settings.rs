//! Application and SMTP settings.
//!
//! Settings are stored as append-only rows; the most recently created
//! row is authoritative.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub id: Uuid,
    pub app_name: String,
    pub logo_url: String,
    pub favicon_url: String,
    pub maps_api_key: String,
    pub allowed_regions: Vec<String>,
    pub primary_color: String,
    pub secondary_color: String,
    pub support_email: String,
    pub support_phone: String,
    pub terms_and_conditions: String,
    pub privacy_policy: String,
    pub about_page: String,
    pub disclaimer: String,
    pub email_header_text: String,
    pub email_footer_text: String,
    pub website_url: String,
    pub company_address: String,
    pub company_phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppSettings {
    pub app_name: String,
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
    pub maps_api_key: Option<String>,
    pub allowed_regions: Option<Vec<String>>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub support_email: Option<String>,
    pub support_phone: Option<String>,
    pub terms_and_conditions: Option<String>,
    pub privacy_policy: Option<String>,
    pub about_page: Option<String>,
    pub disclaimer: Option<String>,
    pub email_header_text: Option<String>,
    pub email_footer_text: Option<String>,
    pub website_url: Option<String>,
    pub company_address: Option<String>,
    pub company_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppSettings {
    pub app_name: Option<String>,
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
    pub maps_api_key: Option<String>,
    pub allowed_regions: Option<Vec<String>>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub support_email: Option<String>,
    pub support_phone: Option<String>,
    pub terms_and_conditions: Option<String>,
    pub privacy_policy: Option<String>,
    pub about_page: Option<String>,
    pub disclaimer: Option<String>,
    pub email_header_text: Option<String>,
    pub email_footer_text: Option<String>,
    pub website_url: Option<String>,
    pub company_address: Option<String>,
    pub company_phone: Option<String>,
}

/// Outbound mail configuration. The password is stored encrypted
/// (AES-256-GCM) and never returned to clients in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    /// Base64 `nonce || ciphertext` of the SMTP password.
    pub password_enc: String,
    /// One of `tls`, `ssl`, `none`.
    pub encryption: String,
    pub from_email: String,
    pub from_name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateSmtpConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password_enc: Option<String>,
    pub encryption: Option<String>,
    pub from_email: Option<String>,
    pub from_name: Option<String>,
    pub active: Option<bool>,
}
