//! Service account and API key domain models.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant-scoped automation identity, owned by a member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccount {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub owner_user_id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateServiceAccount {
    pub tenant_id: Uuid,
    pub owner_user_id: Uuid,
    pub name: String,
    pub description: String,
}

/// Access class granted to an API key. Read covers safe HTTP methods
/// (GET/HEAD/OPTIONS); Write covers everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyScope {
    Read,
    Write,
}

impl fmt::Display for KeyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeyScope::Read => "read",
            KeyScope::Write => "write",
        })
    }
}

/// Credential bound to one service account.
///
/// The raw secret is never persisted — only `sha256(secret)` and the
/// first 16 characters as a display prefix. Revocation is a tombstone:
/// a revoked key is indistinguishable from an unknown one at lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub service_account_id: Uuid,
    pub name: String,
    /// Hex-encoded SHA-256 of the raw secret.
    pub secret_hash: String,
    /// First 16 characters of the raw secret, for display lists.
    pub secret_prefix: String,
    /// Non-empty subset of {read, write}.
    pub scopes: BTreeSet<KeyScope>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateApiKey {
    pub tenant_id: Uuid,
    pub service_account_id: Uuid,
    pub name: String,
    pub secret_hash: String,
    pub secret_prefix: String,
    pub scopes: BTreeSet<KeyScope>,
}
