//! Rentora Core — domain models, repository traits, and the shared
//! error type for the property-rental marketplace backend.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{RentoraError, RentoraResult};
