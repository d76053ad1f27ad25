//! The resolved caller identity for one request.
//!
//! A [`Principal`] is built once per request by the resolver in
//! `vigil-auth` and passed explicitly through every service call — there
//! is no ambient/global "current user". It is immutable after
//! construction.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{VigilError, VigilResult};
use crate::models::service_account::KeyScope;

/// How the caller authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthKind {
    Session,
    ApiKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub auth: AuthKind,
    pub user_id: Uuid,
    /// Active tenant: the API key's bound tenant, or the tenant the
    /// session last switched into. `None` for sessions that have not
    /// selected a tenant yet.
    pub tenant_id: Option<Uuid>,
    pub api_key_id: Option<Uuid>,
    /// Present only for API-key principals. Session principals have
    /// full method access subject to role policy.
    pub scopes: Option<BTreeSet<KeyScope>>,
    /// Session id backing a session principal, for logout and
    /// tenant-switch persistence.
    pub session_id: Option<Uuid>,
}

impl Principal {
    /// Build a session principal.
    pub fn session(user_id: Uuid, session_id: Uuid, active_tenant_id: Option<Uuid>) -> Self {
        Principal {
            auth: AuthKind::Session,
            user_id,
            tenant_id: active_tenant_id,
            api_key_id: None,
            scopes: None,
            session_id: Some(session_id),
        }
    }

    /// Build an API-key principal bound to the key's tenant.
    pub fn api_key(
        user_id: Uuid,
        tenant_id: Uuid,
        api_key_id: Uuid,
        scopes: BTreeSet<KeyScope>,
    ) -> Self {
        Principal {
            auth: AuthKind::ApiKey,
            user_id,
            tenant_id: Some(tenant_id),
            api_key_id: Some(api_key_id),
            scopes: Some(scopes),
            session_id: None,
        }
    }

    /// The active tenant, or `TenantContextRequired` for tenant-scoped
    /// endpoints reached without one. Checked before any resource
    /// lookup.
    pub fn active_tenant(&self) -> VigilResult<Uuid> {
        self.tenant_id.ok_or(VigilError::TenantContextRequired)
    }

    /// Whether an API-key principal holds the given scope. Session
    /// principals always pass.
    pub fn has_scope(&self, scope: KeyScope) -> bool {
        match &self.scopes {
            Some(scopes) => scopes.contains(&scope),
            None => true,
        }
    }

    /// API keys may not manage other keys or service accounts; a leaked
    /// key must not be able to mint itself new credentials.
    pub fn require_session(&self) -> VigilResult<()> {
        match self.auth {
            AuthKind::Session => Ok(()),
            AuthKind::ApiKey => Err(VigilError::PermissionDenied {
                reason: "API key management requires a session".into(),
            }),
        }
    }
}

/// HTTP method class, used to pick the scope an API key must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodClass {
    Safe,
    Mutating,
}

impl MethodClass {
    /// Classify an HTTP method name (case-insensitive).
    pub fn of(method: &str) -> Self {
        if method.eq_ignore_ascii_case("GET")
            || method.eq_ignore_ascii_case("HEAD")
            || method.eq_ignore_ascii_case("OPTIONS")
        {
            MethodClass::Safe
        } else {
            MethodClass::Mutating
        }
    }

    pub fn required_scope(&self) -> KeyScope {
        match self {
            MethodClass::Safe => KeyScope::Read,
            MethodClass::Mutating => KeyScope::Write,
        }
    }
}
