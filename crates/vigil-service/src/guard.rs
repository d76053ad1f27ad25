//! Tenant isolation enforcement.
//!
//! The central invariant: existence is resolved before permission, and
//! existence itself is scoped to the caller's active tenant. A resource
//! in another tenant and a resource that never existed are
//! indistinguishable — both are NotFound. Only a resource confirmed to
//! exist within the active tenant may produce a permission denial.

use uuid::Uuid;
use vigil_core::error::{VigilError, VigilResult};
use vigil_core::models::tenant::Membership;
use vigil_core::policy::PolicySubject;
use vigil_core::principal::Principal;
use vigil_core::repository::TenantRepository;

/// The caller's verified standing within their active tenant.
#[derive(Debug, Clone)]
pub struct GuardedContext {
    pub tenant_id: Uuid,
    pub membership: Membership,
    pub subject: PolicySubject,
}

/// Resolves a [`Principal`] into a [`GuardedContext`] for tenant-scoped
/// operations.
#[derive(Clone)]
pub struct TenantIsolationGuard<T: TenantRepository> {
    tenant_repo: T,
}

impl<T: TenantRepository> TenantIsolationGuard<T> {
    pub fn new(tenant_repo: T) -> Self {
        Self { tenant_repo }
    }

    /// Resolve the active tenant and the caller's membership in it.
    ///
    /// No active tenant is a distinct client error, checked before any
    /// lookup. A missing membership is NotFound — never Forbidden — so
    /// non-members cannot confirm a tenant exists.
    pub async fn resolve(&self, principal: &Principal) -> VigilResult<GuardedContext> {
        let tenant_id = principal.active_tenant()?;
        let membership = self
            .tenant_repo
            .get_membership(tenant_id, principal.user_id)
            .await?
            .ok_or_else(|| VigilError::not_found("tenant"))?;
        let subject = PolicySubject::new(principal.user_id, tenant_id, membership.role);
        Ok(GuardedContext {
            tenant_id,
            membership,
            subject,
        })
    }

    /// Membership check for an explicit tenant id (tenant switching).
    /// Same NotFound discipline as [`resolve`](Self::resolve).
    pub async fn require_membership(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> VigilResult<Membership> {
        self.tenant_repo
            .get_membership(tenant_id, user_id)
            .await?
            .ok_or_else(|| VigilError::not_found("tenant"))
    }
}

/// Existence check helper: a `None` lookup result becomes NotFound for
/// the named entity kind. Call this before any policy evaluation on the
/// resource.
pub fn found<R>(resource: Option<R>, entity: &str) -> VigilResult<R> {
    resource.ok_or_else(|| VigilError::not_found(entity))
}
