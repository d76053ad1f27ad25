//! Vigil Store — in-memory repository implementations.
//!
//! Each repository holds its own `RwLock`-guarded maps behind an `Arc`,
//! so cloned handles share state. The isolation contract is enforced in
//! the repository code itself: every tenant-scoped access filters by
//! `tenant_id`, with no backing row-security mechanism to fall back on.
//! A durable backend would implement the same traits.

pub mod repository;

pub use repository::{
    MemApiKeyRepository, MemAuditLogRepository, MemAuthRepository, MemIncidentRepository,
    MemTenantRepository, MemUsageRepository,
};
