//! Program compliance tracking: enrolled programs with their required records,
//! reviews and findings, and invite-only user accounts.
//!
//! Services take the acting user as an explicit [`authorization::Actor`] and run
//! every permission check, mutation and side effect inside one store transaction.

pub mod accounts;
pub mod authorization;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod programs;
pub mod store;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;

pub use accounts::{AccountService, AccountSettings};
pub use authorization::Actor;
pub use catalog::CatalogService;
pub use error::{AppError, ServiceError};
pub use programs::ProgramService;
pub use store::{EntityStore, MemoryStore};
