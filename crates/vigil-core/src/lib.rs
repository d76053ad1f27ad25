//! Vigil core — domain models, repository traits, the RBAC policy
//! engine, the incident status state machine, the pagination cursor
//! codec, and the shared error taxonomy.
//!
//! This crate performs no I/O. Everything here is exercised by the
//! service layer through explicit, per-request [`principal::Principal`]
//! values.

pub mod cursor;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod policy;
pub mod principal;
pub mod repository;

pub use error::{VigilError, VigilResult};
