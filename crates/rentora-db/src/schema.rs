//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD subject_id ON TABLE user TYPE option<string>;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD name ON TABLE user TYPE string;
DEFINE FIELD surname ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE option<string>;
DEFINE FIELD phone ON TABLE user TYPE option<string>;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['tenant', 'landlord', 'admin', \
    'service_provider'];
DEFINE FIELD registration_type ON TABLE user TYPE string \
    ASSERT $value IN ['GOOGLE', 'FACEBOOK', 'APPLE', 'EMAIL'];
DEFINE FIELD two_factor_enabled ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD two_factor_secret ON TABLE user TYPE option<string>;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_subject ON TABLE user \
    COLUMNS subject_id UNIQUE;
DEFINE INDEX idx_user_email ON TABLE user \
    COLUMNS email UNIQUE;

-- =======================================================================
-- Properties
-- =======================================================================
DEFINE TABLE property SCHEMAFULL;
DEFINE FIELD title ON TABLE property TYPE string;
DEFINE FIELD description ON TABLE property TYPE option<string>;
DEFINE FIELD price ON TABLE property TYPE int;
DEFINE FIELD currency ON TABLE property TYPE string DEFAULT 'ZAR';
DEFINE FIELD property_type ON TABLE property TYPE string;
DEFINE FIELD rental_type ON TABLE property TYPE string;
DEFINE FIELD rental_period ON TABLE property TYPE string \
    DEFAULT 'monthly';
DEFINE FIELD bedrooms ON TABLE property TYPE int;
DEFINE FIELD bathrooms ON TABLE property TYPE int;
DEFINE FIELD area ON TABLE property TYPE option<float>;
DEFINE FIELD location ON TABLE property TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD amenities ON TABLE property TYPE array DEFAULT [];
DEFINE FIELD amenities.* ON TABLE property TYPE string;
DEFINE FIELD images ON TABLE property TYPE array DEFAULT [];
DEFINE FIELD images.* ON TABLE property TYPE string;
DEFINE FIELD landlord_id ON TABLE property TYPE string;
DEFINE FIELD available_date ON TABLE property TYPE option<datetime>;
DEFINE FIELD status ON TABLE property TYPE string \
    ASSERT $value IN ['available', 'rented', 'archived'];
DEFINE FIELD created_at ON TABLE property TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE property TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_property_landlord ON TABLE property \
    COLUMNS landlord_id;

-- =======================================================================
-- Rental applications
-- =======================================================================
DEFINE TABLE application SCHEMAFULL;
DEFINE FIELD property_id ON TABLE application TYPE string;
DEFINE FIELD tenant_id ON TABLE application TYPE string;
DEFINE FIELD status ON TABLE application TYPE string \
    ASSERT $value IN ['pending', 'approved', 'rejected', 'withdrawn'];
DEFINE FIELD move_in_date ON TABLE application TYPE option<datetime>;
DEFINE FIELD message ON TABLE application TYPE option<string>;
DEFINE FIELD documents ON TABLE application TYPE array DEFAULT [];
DEFINE FIELD created_at ON TABLE application TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE application TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_application_tenant ON TABLE application \
    COLUMNS tenant_id;

-- =======================================================================
-- Support tickets
-- =======================================================================
DEFINE TABLE ticket SCHEMAFULL;
DEFINE FIELD ticket_number ON TABLE ticket TYPE string;
DEFINE FIELD subject ON TABLE ticket TYPE string;
DEFINE FIELD description ON TABLE ticket TYPE string;
DEFINE FIELD status ON TABLE ticket TYPE string \
    ASSERT $value IN ['open', 'in_progress', 'resolved', 'closed', \
    'escalated'];
DEFINE FIELD priority ON TABLE ticket TYPE string \
    ASSERT $value IN ['low', 'medium', 'high', 'urgent'];
DEFINE FIELD category ON TABLE ticket TYPE string;
DEFINE FIELD customer_email ON TABLE ticket TYPE string;
DEFINE FIELD customer_name ON TABLE ticket TYPE string;
DEFINE FIELD assigned_to ON TABLE ticket TYPE option<string>;
DEFINE FIELD tags ON TABLE ticket TYPE array DEFAULT [];
DEFINE FIELD tags.* ON TABLE ticket TYPE string;
DEFINE FIELD sla_due_at ON TABLE ticket TYPE datetime;
DEFINE FIELD last_activity_at ON TABLE ticket TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD created_at ON TABLE ticket TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE ticket TYPE datetime \
    DEFAULT time::now();

DEFINE TABLE ticket_message SCHEMAFULL;
DEFINE FIELD ticket_id ON TABLE ticket_message TYPE string;
DEFINE FIELD author ON TABLE ticket_message TYPE string;
DEFINE FIELD body ON TABLE ticket_message TYPE string;
DEFINE FIELD internal ON TABLE ticket_message TYPE bool \
    DEFAULT false;
DEFINE FIELD created_at ON TABLE ticket_message TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_ticket_message_ticket ON TABLE ticket_message \
    COLUMNS ticket_id;

-- =======================================================================
-- Settings (append-only; latest row is authoritative)
-- =======================================================================
DEFINE TABLE settings SCHEMAFULL;
DEFINE FIELD app_name ON TABLE settings TYPE string;
DEFINE FIELD logo_url ON TABLE settings TYPE string DEFAULT '';
DEFINE FIELD favicon_url ON TABLE settings TYPE string DEFAULT '';
DEFINE FIELD maps_api_key ON TABLE settings TYPE string DEFAULT '';
DEFINE FIELD allowed_regions ON TABLE settings TYPE array DEFAULT [];
DEFINE FIELD allowed_regions.* ON TABLE settings TYPE string;
DEFINE FIELD primary_color ON TABLE settings TYPE string \
    DEFAULT '#000000';
DEFINE FIELD secondary_color ON TABLE settings TYPE string \
    DEFAULT '#000000';
DEFINE FIELD support_email ON TABLE settings TYPE string DEFAULT '';
DEFINE FIELD support_phone ON TABLE settings TYPE string DEFAULT '';
DEFINE FIELD terms_and_conditions ON TABLE settings TYPE string \
    DEFAULT '';
DEFINE FIELD privacy_policy ON TABLE settings TYPE string DEFAULT '';
DEFINE FIELD about_page ON TABLE settings TYPE string DEFAULT '';
DEFINE FIELD disclaimer ON TABLE settings TYPE string DEFAULT '';
DEFINE FIELD email_header_text ON TABLE settings TYPE string \
    DEFAULT '';
DEFINE FIELD email_footer_text ON TABLE settings TYPE string \
    DEFAULT '';
DEFINE FIELD website_url ON TABLE settings TYPE string DEFAULT '';
DEFINE FIELD company_address ON TABLE settings TYPE string \
    DEFAULT '';
DEFINE FIELD company_phone ON TABLE settings TYPE string DEFAULT '';
DEFINE FIELD smtp_host ON TABLE settings TYPE string DEFAULT '';
DEFINE FIELD smtp_port ON TABLE settings TYPE int DEFAULT 587;
DEFINE FIELD smtp_username ON TABLE settings TYPE string DEFAULT '';
DEFINE FIELD smtp_password_enc ON TABLE settings TYPE string \
    DEFAULT '';
DEFINE FIELD smtp_encryption ON TABLE settings TYPE string \
    ASSERT $value IN ['tls', 'ssl', 'none'] DEFAULT 'tls';
DEFINE FIELD smtp_from_email ON TABLE settings TYPE string \
    DEFAULT '';
DEFINE FIELD smtp_from_name ON TABLE settings TYPE string DEFAULT '';
DEFINE FIELD smtp_is_active ON TABLE settings TYPE bool \
    DEFAULT false;
DEFINE FIELD created_at ON TABLE settings TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE settings TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Service marketplace: ads, bids, catalogues
-- =======================================================================
DEFINE TABLE ad SCHEMAFULL;
DEFINE FIELD title ON TABLE ad TYPE string;
DEFINE FIELD owner_id ON TABLE ad TYPE option<string>;
DEFINE FIELD owner_name ON TABLE ad TYPE string;
DEFINE FIELD description ON TABLE ad TYPE string;
DEFINE FIELD category ON TABLE ad TYPE string;
DEFINE FIELD location ON TABLE ad TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD price ON TABLE ad TYPE int;
DEFINE FIELD images ON TABLE ad TYPE array DEFAULT [];
DEFINE FIELD images.* ON TABLE ad TYPE string;
DEFINE FIELD documents ON TABLE ad TYPE array DEFAULT [];
DEFINE FIELD documents.* ON TABLE ad TYPE string;
DEFINE FIELD status ON TABLE ad TYPE string \
    ASSERT $value IN ['open', 'closed'];
DEFINE FIELD bid_count ON TABLE ad TYPE int DEFAULT 0;
DEFINE FIELD created_at ON TABLE ad TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE ad TYPE datetime \
    DEFAULT time::now();

DEFINE TABLE bid SCHEMAFULL;
DEFINE FIELD ad_id ON TABLE bid TYPE string;
DEFINE FIELD bidder_id ON TABLE bid TYPE string;
DEFINE FIELD bidder_name ON TABLE bid TYPE string;
DEFINE FIELD amount ON TABLE bid TYPE int;
DEFINE FIELD message ON TABLE bid TYPE option<string>;
DEFINE FIELD status ON TABLE bid TYPE string \
    ASSERT $value IN ['placed', 'accepted', 'rejected'];
DEFINE FIELD created_at ON TABLE bid TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE bid TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_bid_ad ON TABLE bid COLUMNS ad_id;

DEFINE TABLE catalogue SCHEMAFULL;
DEFINE FIELD provider_id ON TABLE catalogue TYPE string;
DEFINE FIELD services ON TABLE catalogue TYPE array DEFAULT [];
DEFINE FIELD services.* ON TABLE catalogue TYPE string;
DEFINE FIELD created_at ON TABLE catalogue TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE catalogue TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_catalogue_provider ON TABLE catalogue \
    COLUMNS provider_id UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
