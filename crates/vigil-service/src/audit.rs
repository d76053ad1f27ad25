//! Best-effort audit recording and audit-log reads.

use uuid::Uuid;
use vigil_core::cursor::{Page, PageRequest};
use vigil_core::error::VigilResult;
use vigil_core::models::audit::{AuditLogEvent, CreateAuditLogEvent};
use vigil_core::policy::{Action, assert_authorized};
use vigil_core::principal::Principal;
use vigil_core::repository::{AuditLogRepository, TenantRepository};

use crate::guard::TenantIsolationGuard;

/// Fire-and-forget recorder of security-relevant events.
///
/// [`AuditSink::record_safely`] swallows and logs any failure so the
/// audit trail is never in the same failure domain as the primary
/// write. Every sensitive mutation calls it exactly once, after the
/// primary write succeeds.
#[derive(Clone)]
pub struct AuditSink<L: AuditLogRepository> {
    repo: L,
}

impl<L: AuditLogRepository> AuditSink<L> {
    pub fn new(repo: L) -> Self {
        Self { repo }
    }

    /// Persist one immutable event, surfacing failures.
    pub async fn record(&self, event: CreateAuditLogEvent) -> VigilResult<AuditLogEvent> {
        self.repo.create_event(event).await
    }

    /// Persist one immutable event, swallowing failures.
    pub async fn record_safely(&self, event: CreateAuditLogEvent) {
        let action = event.action.clone();
        if let Err(e) = self.repo.create_event(event).await {
            tracing::warn!(action = %action, error = %e, "audit write failed");
        }
    }
}

/// Tenant-scoped audit-log reads.
pub struct AuditLogService<L: AuditLogRepository, T: TenantRepository> {
    repo: L,
    guard: TenantIsolationGuard<T>,
}

impl<L: AuditLogRepository, T: TenantRepository> AuditLogService<L, T> {
    pub fn new(repo: L, tenant_repo: T) -> Self {
        Self {
            repo,
            guard: TenantIsolationGuard::new(tenant_repo),
        }
    }

    /// List the active tenant's audit events, newest first.
    pub async fn list_events(
        &self,
        principal: &Principal,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> VigilResult<Page<AuditLogEvent>> {
        let ctx = self.guard.resolve(principal).await?;
        assert_authorized(Action::AuditLogRead, &ctx.subject, None)?;
        let page = PageRequest::from_raw(limit, cursor)?;
        self.repo.list_events(ctx.tenant_id, page).await
    }
}

/// Helper shared by audit-event producers: only the domain of an email
/// ever reaches audit metadata.
pub fn email_domain(email: &str) -> &str {
    email.rsplit_once('@').map(|(_, d)| d).unwrap_or("")
}

#[derive(Debug, Clone, Copy)]
pub struct AuditTarget<'a> {
    pub target_type: &'a str,
    pub target_id: Uuid,
}

/// Convenience constructor for tenant-scoped audit events.
pub fn tenant_event(
    tenant_id: Uuid,
    actor_user_id: Uuid,
    action: &str,
    target: AuditTarget<'_>,
    metadata: serde_json::Value,
) -> CreateAuditLogEvent {
    CreateAuditLogEvent {
        tenant_id: Some(tenant_id),
        actor_user_id: Some(actor_user_id),
        action: action.into(),
        target_type: Some(target.target_type.into()),
        target_id: Some(target.target_id),
        metadata,
        trace_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_domain_strips_local_part() {
        assert_eq!(email_domain("alice@example.com"), "example.com");
        assert_eq!(email_domain("no-at-sign"), "");
    }
}
