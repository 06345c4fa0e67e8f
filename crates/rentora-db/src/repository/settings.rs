//! SurrealDB implementation of [`SettingsRepository`].
//!
//! Settings rows are append-only; `save` inserts a new row and reads
//! return the most recently created one. SMTP columns live on the same
//! row and are read/updated through dedicated methods so the app
//! settings surface never exposes the encrypted password.

use chrono::{DateTime, Utc};
use rentora_core::error::RentoraResult;
use rentora_core::models::settings::{
    AppSettings, CreateAppSettings, SmtpConfig, UpdateAppSettings, UpdateSmtpConfig,
};
use rentora_core::repository::SettingsRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct SettingsRowWithId {
    record_id: String,
    app_name: String,
    logo_url: String,
    favicon_url: String,
    maps_api_key: String,
    allowed_regions: Vec<String>,
    primary_color: String,
    secondary_color: String,
    support_email: String,
    support_phone: String,
    terms_and_conditions: String,
    privacy_policy: String,
    about_page: String,
    disclaimer: String,
    email_header_text: String,
    email_footer_text: String,
    website_url: String,
    company_address: String,
    company_phone: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct SmtpRow {
    smtp_host: String,
    smtp_port: u16,
    smtp_username: String,
    smtp_password_enc: String,
    smtp_encryption: String,
    smtp_from_email: String,
    smtp_from_name: String,
    smtp_is_active: bool,
}

#[derive(Debug, SurrealValue)]
struct IdRow {
    record_id: String,
}

impl SettingsRowWithId {
    fn try_into_settings(self) -> Result<AppSettings, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(AppSettings {
            id,
            app_name: self.app_name,
            logo_url: self.logo_url,
            favicon_url: self.favicon_url,
            maps_api_key: self.maps_api_key,
            allowed_regions: self.allowed_regions,
            primary_color: self.primary_color,
            secondary_color: self.secondary_color,
            support_email: self.support_email,
            support_phone: self.support_phone,
            terms_and_conditions: self.terms_and_conditions,
            privacy_policy: self.privacy_policy,
            about_page: self.about_page,
            disclaimer: self.disclaimer,
            email_header_text: self.email_header_text,
            email_footer_text: self.email_footer_text,
            website_url: self.website_url,
            company_address: self.company_address,
            company_phone: self.company_phone,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl SmtpRow {
    fn into_config(self) -> SmtpConfig {
        SmtpConfig {
            host: self.smtp_host,
            port: self.smtp_port,
            username: self.smtp_username,
            password_enc: self.smtp_password_enc,
            encryption: self.smtp_encryption,
            from_email: self.smtp_from_email,
            from_name: self.smtp_from_name,
            active: self.smtp_is_active,
        }
    }
}

/// SurrealDB implementation of the settings repository.
#[derive(Clone)]
pub struct SurrealSettingsRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSettingsRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Record id of the latest settings row, if any.
    async fn latest_id(&self) -> Result<Option<String>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id FROM settings \
                 ORDER BY created_at DESC LIMIT 1",
            )
            .await?;
        let rows: Vec<IdRow> = result.take(0)?;
        Ok(rows.into_iter().next().map(|r| r.record_id))
    }
}

impl<C: Connection> SettingsRepository for SurrealSettingsRepository<C> {
    async fn get_latest(&self) -> RentoraResult<Option<AppSettings>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM settings \
                 ORDER BY created_at DESC LIMIT 1",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SettingsRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_settings()?)),
            None => Ok(None),
        }
    }

    async fn save(&self, input: CreateAppSettings) -> RentoraResult<AppSettings> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('settings', $id) SET \
                 app_name = $app_name, \
                 logo_url = $logo_url, favicon_url = $favicon_url, \
                 maps_api_key = $maps_api_key, \
                 allowed_regions = $allowed_regions, \
                 primary_color = $primary_color, \
                 secondary_color = $secondary_color, \
                 support_email = $support_email, \
                 support_phone = $support_phone, \
                 terms_and_conditions = $terms_and_conditions, \
                 privacy_policy = $privacy_policy, \
                 about_page = $about_page, disclaimer = $disclaimer, \
                 email_header_text = $email_header_text, \
                 email_footer_text = $email_footer_text, \
                 website_url = $website_url, \
                 company_address = $company_address, \
                 company_phone = $company_phone",
            )
            .bind(("id", id_str.clone()))
            .bind(("app_name", input.app_name))
            .bind(("logo_url", input.logo_url.unwrap_or_default()))
            .bind(("favicon_url", input.favicon_url.unwrap_or_default()))
            .bind(("maps_api_key", input.maps_api_key.unwrap_or_default()))
            .bind(("allowed_regions", input.allowed_regions.unwrap_or_default()))
            .bind((
                "primary_color",
                input.primary_color.unwrap_or_else(|| "#000000".into()),
            ))
            .bind((
                "secondary_color",
                input.secondary_color.unwrap_or_else(|| "#000000".into()),
            ))
            .bind(("support_email", input.support_email.unwrap_or_default()))
            .bind(("support_phone", input.support_phone.unwrap_or_default()))
            .bind((
                "terms_and_conditions",
                input.terms_and_conditions.unwrap_or_default(),
            ))
            .bind(("privacy_policy", input.privacy_policy.unwrap_or_default()))
            .bind(("about_page", input.about_page.unwrap_or_default()))
            .bind(("disclaimer", input.disclaimer.unwrap_or_default()))
            .bind((
                "email_header_text",
                input.email_header_text.unwrap_or_default(),
            ))
            .bind((
                "email_footer_text",
                input.email_footer_text.unwrap_or_default(),
            ))
            .bind(("website_url", input.website_url.unwrap_or_default()))
            .bind(("company_address", input.company_address.unwrap_or_default()))
            .bind(("company_phone", input.company_phone.unwrap_or_default()))
            .await
            .map_err(|e| DbError::from_write("settings", e))?;

        result
            .check()
            .map_err(|e| DbError::from_write("settings", e))?;

        self.get_latest().await?.ok_or_else(|| {
            DbError::NotFound {
                entity: "settings".into(),
                id: id_str,
            }
            .into()
        })
    }

    async fn update(&self, input: UpdateAppSettings) -> RentoraResult<Option<AppSettings>> {
        let Some(id_str) = self.latest_id().await? else {
            return Ok(None);
        };

        let mut sets = Vec::new();
        if input.app_name.is_some() {
            sets.push("app_name = $app_name");
        }
        if input.logo_url.is_some() {
            sets.push("logo_url = $logo_url");
        }
        if input.favicon_url.is_some() {
            sets.push("favicon_url = $favicon_url");
        }
        if input.maps_api_key.is_some() {
            sets.push("maps_api_key = $maps_api_key");
        }
        if input.allowed_regions.is_some() {
            sets.push("allowed_regions = $allowed_regions");
        }
        if input.primary_color.is_some() {
            sets.push("primary_color = $primary_color");
        }
        if input.secondary_color.is_some() {
            sets.push("secondary_color = $secondary_color");
        }
        if input.support_email.is_some() {
            sets.push("support_email = $support_email");
        }
        if input.support_phone.is_some() {
            sets.push("support_phone = $support_phone");
        }
        if input.terms_and_conditions.is_some() {
            sets.push("terms_and_conditions = $terms_and_conditions");
        }
        if input.privacy_policy.is_some() {
            sets.push("privacy_policy = $privacy_policy");
        }
        if input.about_page.is_some() {
            sets.push("about_page = $about_page");
        }
        if input.disclaimer.is_some() {
            sets.push("disclaimer = $disclaimer");
        }
        if input.email_header_text.is_some() {
            sets.push("email_header_text = $email_header_text");
        }
        if input.email_footer_text.is_some() {
            sets.push("email_footer_text = $email_footer_text");
        }
        if input.website_url.is_some() {
            sets.push("website_url = $website_url");
        }
        if input.company_address.is_some() {
            sets.push("company_address = $company_address");
        }
        if input.company_phone.is_some() {
            sets.push("company_phone = $company_phone");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('settings', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str));

        if let Some(app_name) = input.app_name {
            builder = builder.bind(("app_name", app_name));
        }
        if let Some(logo_url) = input.logo_url {
            builder = builder.bind(("logo_url", logo_url));
        }
        if let Some(favicon_url) = input.favicon_url {
            builder = builder.bind(("favicon_url", favicon_url));
        }
        if let Some(maps_api_key) = input.maps_api_key {
            builder = builder.bind(("maps_api_key", maps_api_key));
        }
        if let Some(allowed_regions) = input.allowed_regions {
            builder = builder.bind(("allowed_regions", allowed_regions));
        }
        if let Some(primary_color) = input.primary_color {
            builder = builder.bind(("primary_color", primary_color));
        }
        if let Some(secondary_color) = input.secondary_color {
            builder = builder.bind(("secondary_color", secondary_color));
        }
        if let Some(support_email) = input.support_email {
            builder = builder.bind(("support_email", support_email));
        }
        if let Some(support_phone) = input.support_phone {
            builder = builder.bind(("support_phone", support_phone));
        }
        if let Some(terms_and_conditions) = input.terms_and_conditions {
            builder = builder.bind(("terms_and_conditions", terms_and_conditions));
        }
        if let Some(privacy_policy) = input.privacy_policy {
            builder = builder.bind(("privacy_policy", privacy_policy));
        }
        if let Some(about_page) = input.about_page {
            builder = builder.bind(("about_page", about_page));
        }
        if let Some(disclaimer) = input.disclaimer {
            builder = builder.bind(("disclaimer", disclaimer));
        }
        if let Some(email_header_text) = input.email_header_text {
            builder = builder.bind(("email_header_text", email_header_text));
        }
        if let Some(email_footer_text) = input.email_footer_text {
            builder = builder.bind(("email_footer_text", email_footer_text));
        }
        if let Some(website_url) = input.website_url {
            builder = builder.bind(("website_url", website_url));
        }
        if let Some(company_address) = input.company_address {
            builder = builder.bind(("company_address", company_address));
        }
        if let Some(company_phone) = input.company_phone {
            builder = builder.bind(("company_phone", company_phone));
        }

        let result = builder
            .await
            .map_err(|e| DbError::from_write("settings", e))?;
        result
            .check()
            .map_err(|e| DbError::from_write("settings", e))?;

        self.get_latest().await
    }

    async fn get_smtp(&self) -> RentoraResult<Option<SmtpConfig>> {
        let mut result = self
            .db
            .query(
                "SELECT smtp_host, smtp_port, smtp_username, \
                 smtp_password_enc, smtp_encryption, smtp_from_email, \
                 smtp_from_name, smtp_is_active FROM settings \
                 ORDER BY created_at DESC LIMIT 1",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SmtpRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(|r| r.into_config()))
    }

    async fn save_smtp(&self, input: SmtpConfig) -> RentoraResult<SmtpConfig> {
        let Some(id_str) = self.latest_id().await? else {
            return Err(DbError::NotFound {
                entity: "settings".into(),
                id: "latest".into(),
            }
            .into());
        };

        let result = self
            .db
            .query(
                "UPDATE type::record('settings', $id) SET \
                 smtp_host = $host, smtp_port = $port, \
                 smtp_username = $username, \
                 smtp_password_enc = $password_enc, \
                 smtp_encryption = $encryption, \
                 smtp_from_email = $from_email, \
                 smtp_from_name = $from_name, \
                 smtp_is_active = $active, \
                 updated_at = time::now()",
            )
            .bind(("id", id_str))
            .bind(("host", input.host))
            .bind(("port", input.port))
            .bind(("username", input.username))
            .bind(("password_enc", input.password_enc))
            .bind(("encryption", input.encryption))
            .bind(("from_email", input.from_email))
            .bind(("from_name", input.from_name))
            .bind(("active", input.active))
            .await
            .map_err(|e| DbError::from_write("settings", e))?;

        result
            .check()
            .map_err(|e| DbError::from_write("settings", e))?;

        self.get_smtp().await?.ok_or_else(|| {
            DbError::NotFound {
                entity: "settings".into(),
                id: "latest".into(),
            }
            .into()
        })
    }

    async fn update_smtp(&self, input: UpdateSmtpConfig) -> RentoraResult<Option<SmtpConfig>> {
        let Some(id_str) = self.latest_id().await? else {
            return Ok(None);
        };

        let mut sets = Vec::new();
        if input.host.is_some() {
            sets.push("smtp_host = $host");
        }
        if input.port.is_some() {
            sets.push("smtp_port = $port");
        }
        if input.username.is_some() {
            sets.push("smtp_username = $username");
        }
        if input.password_enc.is_some() {
            sets.push("smtp_password_enc = $password_enc");
        }
        if input.encryption.is_some() {
            sets.push("smtp_encryption = $encryption");
        }
        if input.from_email.is_some() {
            sets.push("smtp_from_email = $from_email");
        }
        if input.from_name.is_some() {
            sets.push("smtp_from_name = $from_name");
        }
        if input.active.is_some() {
            sets.push("smtp_is_active = $active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('settings', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str));

        if let Some(host) = input.host {
            builder = builder.bind(("host", host));
        }
        if let Some(port) = input.port {
            builder = builder.bind(("port", port));
        }
        if let Some(username) = input.username {
            builder = builder.bind(("username", username));
        }
        if let Some(password_enc) = input.password_enc {
            builder = builder.bind(("password_enc", password_enc));
        }
        if let Some(encryption) = input.encryption {
            builder = builder.bind(("encryption", encryption));
        }
        if let Some(from_email) = input.from_email {
            builder = builder.bind(("from_email", from_email));
        }
        if let Some(from_name) = input.from_name {
            builder = builder.bind(("from_name", from_name));
        }
        if let Some(active) = input.active {
            builder = builder.bind(("active", active));
        }

        let result = builder
            .await
            .map_err(|e| DbError::from_write("settings", e))?;
        result
            .check()
            .map_err(|e| DbError::from_write("settings", e))?;

        self.get_smtp().await
    }
}
