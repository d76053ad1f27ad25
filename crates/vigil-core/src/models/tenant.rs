//! Tenant, membership, and invite domain models.
//!
//! Tenants provide full data isolation: every domain entity (incidents,
//! service accounts, usage events, audit entries) is scoped to a tenant,
//! and every read/write path filters by the caller's resolved tenant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::OrgRole;

/// An isolated organizational context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// URL-safe unique identifier (e.g. `acme-prod`).
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTenant {
    pub name: String,
    pub slug: String,
}

/// Binding of a user to a tenant with exactly one org role.
///
/// Unique per (tenant, user). Created on tenant creation (owner) or
/// invite acceptance; invite acceptance overwrites the role in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub role: OrgRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One-time-use invitation into a tenant.
///
/// Only the SHA-256 hash of the invite token is persisted — the raw
/// token mailed to the invitee is the single proof of right-to-accept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantInvite {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub role: OrgRole,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub accepted_by_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateInvite {
    pub tenant_id: Uuid,
    pub email: String,
    pub role: OrgRole,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}
