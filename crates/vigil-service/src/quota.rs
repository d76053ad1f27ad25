//! Per-tenant sliding-window write-quota accounting.
//!
//! Consumption is computed on demand as a sum over append-only usage
//! events inside the rolling window — never a stored counter. The
//! check-then-write pair is deliberately not atomic across concurrent
//! requests: the quota is a soft fairness control, and a burst from one
//! tenant may admit slightly more than the limit.

use chrono::{Duration, Utc};
use uuid::Uuid;
use vigil_core::error::{VigilError, VigilResult};
use vigil_core::models::usage::{CreateUsageEvent, TenantUsageQuota, UsageSummary};
use vigil_core::policy::{Action, assert_authorized};
use vigil_core::principal::Principal;
use vigil_core::repository::{TenantRepository, UsageRepository};

use crate::audit::{AuditSink, AuditTarget, tenant_event};
use crate::config::ServiceConfig;
use crate::guard::TenantIsolationGuard;
use vigil_core::repository::AuditLogRepository;

const WRITE_METRIC: &str = "write";

/// The quota limiter proper — called once per mutating request, before
/// the domain write.
#[derive(Clone)]
pub struct UsageQuotaLimiter<U: UsageRepository> {
    usage_repo: U,
    default_limit: i64,
    window_hours: i64,
}

impl<U: UsageRepository> UsageQuotaLimiter<U> {
    pub fn new(usage_repo: U, config: &ServiceConfig) -> Self {
        Self {
            usage_repo,
            default_limit: config.default_daily_write_limit,
            window_hours: config.usage_window_hours,
        }
    }

    async fn window_state(&self, tenant_id: Uuid) -> VigilResult<(TenantUsageQuota, i64)> {
        // Every tenant has a quota once any write has been attempted.
        let quota = self
            .usage_repo
            .get_or_create_quota(tenant_id, self.default_limit)
            .await?;
        let since = Utc::now() - Duration::hours(self.window_hours);
        let used = self
            .usage_repo
            .sum_usage_since(tenant_id, WRITE_METRIC, since)
            .await?;
        Ok((quota, used))
    }

    /// Admit one write or fail with `QuotaExceeded {limit, used}`
    /// without recording anything.
    pub async fn consume_write(&self, tenant_id: Uuid, actor: &Principal) -> VigilResult<UsageSummary> {
        let (quota, used) = self.window_state(tenant_id).await?;
        if used + 1 > quota.daily_write_limit {
            return Err(VigilError::QuotaExceeded {
                limit: quota.daily_write_limit,
                used,
            });
        }
        self.usage_repo
            .create_usage_event(CreateUsageEvent {
                tenant_id,
                metric: WRITE_METRIC.into(),
                amount: 1,
                actor_user_id: Some(actor.user_id),
                api_key_id: actor.api_key_id,
            })
            .await?;
        let used = used + 1;
        Ok(UsageSummary {
            used,
            limit: quota.daily_write_limit,
            remaining: (quota.daily_write_limit - used).max(0),
        })
    }

    /// Current window consumption without admitting anything.
    pub async fn summary(&self, tenant_id: Uuid) -> VigilResult<UsageSummary> {
        let (quota, used) = self.window_state(tenant_id).await?;
        Ok(UsageSummary {
            used,
            limit: quota.daily_write_limit,
            remaining: (quota.daily_write_limit - used).max(0),
        })
    }
}

/// Policy-checked billing surface over the limiter.
pub struct UsageQuotaService<U, T, L>
where
    U: UsageRepository,
    T: TenantRepository,
    L: AuditLogRepository,
{
    limiter: UsageQuotaLimiter<U>,
    usage_repo: U,
    guard: TenantIsolationGuard<T>,
    sink: AuditSink<L>,
}

impl<U, T, L> UsageQuotaService<U, T, L>
where
    U: UsageRepository + Clone,
    T: TenantRepository,
    L: AuditLogRepository,
{
    pub fn new(usage_repo: U, tenant_repo: T, audit_repo: L, config: &ServiceConfig) -> Self {
        Self {
            limiter: UsageQuotaLimiter::new(usage_repo.clone(), config),
            usage_repo,
            guard: TenantIsolationGuard::new(tenant_repo),
            sink: AuditSink::new(audit_repo),
        }
    }

    /// Read the active tenant's usage summary. Billing data: only Owner
    /// and Billing roles may see it.
    pub async fn usage_summary(&self, principal: &Principal) -> VigilResult<UsageSummary> {
        let ctx = self.guard.resolve(principal).await?;
        assert_authorized(Action::BillingRead, &ctx.subject, None)?;
        self.limiter.summary(ctx.tenant_id).await
    }

    /// Change the active tenant's daily write limit.
    pub async fn set_limit(
        &self,
        principal: &Principal,
        daily_write_limit: i64,
    ) -> VigilResult<TenantUsageQuota> {
        if daily_write_limit < 0 {
            return Err(VigilError::validation("write limit must be non-negative"));
        }
        let ctx = self.guard.resolve(principal).await?;
        assert_authorized(Action::BillingManage, &ctx.subject, None)?;
        let quota = self
            .usage_repo
            .set_quota_limit(ctx.tenant_id, daily_write_limit)
            .await?;

        self.sink
            .record_safely(tenant_event(
                ctx.tenant_id,
                principal.user_id,
                "billing.quota_updated",
                AuditTarget {
                    target_type: "tenant_usage_quota",
                    target_id: ctx.tenant_id,
                },
                serde_json::json!({ "daily_write_limit": daily_write_limit }),
            ))
            .await;

        Ok(quota)
    }
}
