//! Shared application state, passed to all route handlers via the
//! `State` extractor.
//!
//! Generic over the SurrealDB engine so the binary runs against the
//! WebSocket client while integration tests run on the in-memory
//! engine. All handles are cheap to clone; no ambient globals.

use std::sync::Arc;

use rentora_auth::identity::IdentityProvider;
use rentora_auth::{AuthConfig, AuthService};
use rentora_db::repository::{
    SurrealAdRepository, SurrealApplicationRepository, SurrealPropertyRepository,
    SurrealSettingsRepository, SurrealTicketRepository, SurrealUserRepository,
};
use surrealdb::{Connection, Surreal};

/// Shared application state.
pub struct AppState<C: Connection> {
    pub users: SurrealUserRepository<C>,
    pub properties: SurrealPropertyRepository<C>,
    pub applications: SurrealApplicationRepository<C>,
    pub tickets: SurrealTicketRepository<C>,
    pub settings: SurrealSettingsRepository<C>,
    pub ads: SurrealAdRepository<C>,
    pub auth: AuthService<SurrealUserRepository<C>>,
}

impl<C: Connection> AppState<C> {
    /// Assemble state from a connected database handle, an identity
    /// provider, and the auth configuration.
    pub fn new(
        db: Surreal<C>,
        provider: Arc<dyn IdentityProvider>,
        auth_config: AuthConfig,
    ) -> Self {
        let users = match &auth_config.pepper {
            Some(pepper) => SurrealUserRepository::with_pepper(db.clone(), pepper.clone()),
            None => SurrealUserRepository::new(db.clone()),
        };

        Self {
            auth: AuthService::new(users.clone(), provider, auth_config),
            users,
            properties: SurrealPropertyRepository::new(db.clone()),
            applications: SurrealApplicationRepository::new(db.clone()),
            tickets: SurrealTicketRepository::new(db.clone()),
            settings: SurrealSettingsRepository::new(db.clone()),
            ads: SurrealAdRepository::new(db),
        }
    }
}

// Manual impl: `Surreal<C>` is clonable for every engine, so no
// `C: Clone` bound is needed.
impl<C: Connection> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            properties: self.properties.clone(),
            applications: self.applications.clone(),
            tickets: self.tickets.clone(),
            settings: self.settings.clone(),
            ads: self.ads.clone(),
            auth: self.auth.clone(),
        }
    }
}
