//! Vigil Service — the domain services composing the authorization,
//! tenancy-isolation, and resource-lifecycle core.
//!
//! Control flow per request: principal resolution (vigil-auth) →
//! tenant-isolation guard → policy engine → quota limiter (mutations
//! only) → repository call → audit sink (fire-and-forget).

pub mod apikeys;
pub mod audit;
pub mod config;
pub mod guard;
pub mod incident;
pub mod quota;
pub mod tenant;

pub use apikeys::{ApiKeyOutput, ApiKeyService};
pub use audit::{AuditLogService, AuditSink};
pub use config::ServiceConfig;
pub use guard::TenantIsolationGuard;
pub use incident::{DeclareIncident, IncidentPatch, IncidentService};
pub use quota::{UsageQuotaLimiter, UsageQuotaService};
pub use tenant::{InviteOutput, TenantService};
