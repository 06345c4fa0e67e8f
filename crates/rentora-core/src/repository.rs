//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Implementations live in the
//! `rentora-db` crate; the auth and HTTP layers depend only on these
//! traits.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::RentoraResult;
use crate::models::{
    ad::{AdBid, Catalogue, CreateAdBid, CreateServiceAd, ServiceAd, UpdateAdBid, UpdateServiceAd},
    application::{ApplicationStatus, CreateApplication, RentalApplication},
    property::{CreateProperty, Property, PropertyFilters, UpdateProperty},
    settings::{AppSettings, CreateAppSettings, SmtpConfig, UpdateAppSettings, UpdateSmtpConfig},
    ticket::{
        CreateTicket, CreateTicketMessage, Ticket, TicketFilters, TicketMessage, TicketStatistics,
        TicketStatus, UpdateTicket,
    },
    user::{CreateUser, UpdateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    /// Create a user. Fails with `AlreadyExists` when the subject id or
    /// email collides with an existing record (unique index backstop).
    fn create(&self, input: CreateUser) -> impl Future<Output = RentoraResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RentoraResult<User>> + Send;
    fn get_by_subject_id(
        &self,
        subject_id: &str,
    ) -> impl Future<Output = RentoraResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = RentoraResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = RentoraResult<User>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = RentoraResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = RentoraResult<PaginatedResult<User>>> + Send;
    fn count(&self) -> impl Future<Output = RentoraResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

pub trait PropertyRepository: Send + Sync {
    fn create(&self, input: CreateProperty)
    -> impl Future<Output = RentoraResult<Property>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RentoraResult<Property>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateProperty,
    ) -> impl Future<Output = RentoraResult<Property>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = RentoraResult<()>> + Send;
    fn list(
        &self,
        filters: PropertyFilters,
        pagination: Pagination,
    ) -> impl Future<Output = RentoraResult<PaginatedResult<Property>>> + Send;
    fn count(&self) -> impl Future<Output = RentoraResult<u64>> + Send;
    fn count_since(
        &self,
        since: DateTime<Utc>,
    ) -> impl Future<Output = RentoraResult<u64>> + Send;
    /// Location objects of properties created since `since`, for
    /// top-city analytics.
    fn locations_since(
        &self,
        since: DateTime<Utc>,
    ) -> impl Future<Output = RentoraResult<Vec<serde_json::Value>>> + Send;
}

// ---------------------------------------------------------------------------
// Rental applications
// ---------------------------------------------------------------------------

pub trait ApplicationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateApplication,
    ) -> impl Future<Output = RentoraResult<RentalApplication>> + Send;
    fn get_by_id(&self, id: Uuid)
    -> impl Future<Output = RentoraResult<RentalApplication>> + Send;
    fn update_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        message: Option<String>,
    ) -> impl Future<Output = RentoraResult<RentalApplication>> + Send;
    fn list_by_tenant(
        &self,
        tenant_id: Uuid,
        status: Option<ApplicationStatus>,
        pagination: Pagination,
    ) -> impl Future<Output = RentoraResult<PaginatedResult<RentalApplication>>> + Send;
    fn count(&self) -> impl Future<Output = RentoraResult<u64>> + Send;
    fn count_pending(&self) -> impl Future<Output = RentoraResult<u64>> + Send;
    fn count_since(
        &self,
        since: DateTime<Utc>,
    ) -> impl Future<Output = RentoraResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Support tickets
// ---------------------------------------------------------------------------

pub trait TicketRepository: Send + Sync {
    /// Create a ticket, assigning the next sequential ticket number and
    /// an SLA due date derived from the priority.
    fn create(&self, input: CreateTicket) -> impl Future<Output = RentoraResult<Ticket>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RentoraResult<Ticket>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateTicket,
    ) -> impl Future<Output = RentoraResult<Ticket>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = RentoraResult<()>> + Send;
    fn set_status(
        &self,
        id: Uuid,
        status: TicketStatus,
    ) -> impl Future<Output = RentoraResult<Ticket>> + Send;
    fn add_message(
        &self,
        input: CreateTicketMessage,
    ) -> impl Future<Output = RentoraResult<TicketMessage>> + Send;
    fn list_messages(
        &self,
        ticket_id: Uuid,
    ) -> impl Future<Output = RentoraResult<Vec<TicketMessage>>> + Send;
    fn list(
        &self,
        filters: TicketFilters,
        pagination: Pagination,
    ) -> impl Future<Output = RentoraResult<PaginatedResult<Ticket>>> + Send;
    fn statistics(&self) -> impl Future<Output = RentoraResult<TicketStatistics>> + Send;
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

pub trait SettingsRepository: Send + Sync {
    /// The most recently created settings row, if any.
    fn get_latest(&self) -> impl Future<Output = RentoraResult<Option<AppSettings>>> + Send;
    fn save(
        &self,
        input: CreateAppSettings,
    ) -> impl Future<Output = RentoraResult<AppSettings>> + Send;
    /// Update the latest row in place; `Ok(None)` when no row exists yet.
    fn update(
        &self,
        input: UpdateAppSettings,
    ) -> impl Future<Output = RentoraResult<Option<AppSettings>>> + Send;
    fn get_smtp(&self) -> impl Future<Output = RentoraResult<Option<SmtpConfig>>> + Send;
    fn save_smtp(&self, input: SmtpConfig) -> impl Future<Output = RentoraResult<SmtpConfig>> + Send;
    fn update_smtp(
        &self,
        input: UpdateSmtpConfig,
    ) -> impl Future<Output = RentoraResult<Option<SmtpConfig>>> + Send;
}

// ---------------------------------------------------------------------------
// Service marketplace (ads, bids, catalogues)
// ---------------------------------------------------------------------------

pub trait AdRepository: Send + Sync {
    fn create_ad(
        &self,
        input: CreateServiceAd,
    ) -> impl Future<Output = RentoraResult<ServiceAd>> + Send;
    fn get_ad(&self, id: Uuid) -> impl Future<Output = RentoraResult<ServiceAd>> + Send;
    fn update_ad(
        &self,
        id: Uuid,
        input: UpdateServiceAd,
    ) -> impl Future<Output = RentoraResult<ServiceAd>> + Send;
    fn delete_ad(&self, id: Uuid) -> impl Future<Output = RentoraResult<()>> + Send;
    fn list_ads(&self) -> impl Future<Output = RentoraResult<Vec<ServiceAd>>> + Send;

    /// Place a bid and increment the ad's bid count.
    fn create_bid(&self, input: CreateAdBid)
    -> impl Future<Output = RentoraResult<AdBid>> + Send;
    fn get_bid(&self, id: Uuid) -> impl Future<Output = RentoraResult<AdBid>> + Send;
    fn update_bid(
        &self,
        id: Uuid,
        input: UpdateAdBid,
    ) -> impl Future<Output = RentoraResult<AdBid>> + Send;
    fn delete_bid(&self, id: Uuid) -> impl Future<Output = RentoraResult<()>> + Send;
    fn list_bids(
        &self,
        ad_id: Option<Uuid>,
    ) -> impl Future<Output = RentoraResult<Vec<AdBid>>> + Send;

    /// Create or replace the provider's catalogue.
    fn upsert_catalogue(
        &self,
        provider_id: Uuid,
        services: Vec<String>,
    ) -> impl Future<Output = RentoraResult<Catalogue>> + Send;
    fn get_catalogue(
        &self,
        provider_id: Uuid,
    ) -> impl Future<Output = RentoraResult<Option<Catalogue>>> + Send;
}
