//! Usage quota and usage event models.
//!
//! Consumption is never stored as a mutable counter: it is reconstructed
//! on demand as a windowed sum over append-only usage events, which is
//! tolerant of partial failures and retried writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One quota row per tenant, materialized lazily on first use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantUsageQuota {
    pub tenant_id: Uuid,
    pub daily_write_limit: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable consumption fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEvent {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub metric: String,
    pub amount: i64,
    pub actor_user_id: Option<Uuid>,
    pub api_key_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUsageEvent {
    pub tenant_id: Uuid,
    pub metric: String,
    pub amount: i64,
    pub actor_user_id: Option<Uuid>,
    pub api_key_id: Option<Uuid>,
}

/// Point-in-time view of a tenant's write budget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UsageSummary {
    pub used: i64,
    pub limit: i64,
    pub remaining: i64,
}
