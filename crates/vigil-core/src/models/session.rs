//! Server-side session record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One authenticated browser session. The cookie carries the raw opaque
/// token; only its SHA-256 hash is stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    /// Tenant the user last switched into, if any.
    pub active_tenant_id: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateSession {
    pub user_id: Uuid,
    pub token_hash: String,
    pub active_tenant_id: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
}
