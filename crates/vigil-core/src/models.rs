//! Domain models for Vigil.
//!
//! These are the core types shared across all crates.

pub mod audit;
pub mod incident;
pub mod role;
pub mod service_account;
pub mod session;
pub mod tenant;
pub mod usage;
pub mod user;
