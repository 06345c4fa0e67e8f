//! SurrealDB repository implementations for the `rentora-core` traits.

mod ads;
mod application;
mod property;
mod settings;
mod ticket;
mod user;

pub use ads::SurrealAdRepository;
pub use application::SurrealApplicationRepository;
pub use property::SurrealPropertyRepository;
pub use settings::SurrealSettingsRepository;
pub use ticket::SurrealTicketRepository;
pub use user::SurrealUserRepository;

use surrealdb_types::SurrealValue;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub total: u64,
}
