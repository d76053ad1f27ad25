//! In-memory implementation of [`UsageRepository`].
//!
//! Consumption is an append-only event log; nothing here keeps a
//! running counter.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;
use vigil_core::error::VigilResult;
use vigil_core::models::usage::{CreateUsageEvent, TenantUsageQuota, UsageEvent};
use vigil_core::repository::UsageRepository;

#[derive(Default)]
struct UsageState {
    quotas: HashMap<Uuid, TenantUsageQuota>,
    events: Vec<UsageEvent>,
}

#[derive(Clone, Default)]
pub struct MemUsageRepository {
    state: Arc<RwLock<UsageState>>,
}

impl MemUsageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UsageRepository for MemUsageRepository {
    async fn get_or_create_quota(
        &self,
        tenant_id: Uuid,
        default_limit: i64,
    ) -> VigilResult<TenantUsageQuota> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let quota = state
            .quotas
            .entry(tenant_id)
            .or_insert(TenantUsageQuota {
                tenant_id,
                daily_write_limit: default_limit,
                created_at: now,
                updated_at: now,
            })
            .clone();
        Ok(quota)
    }

    async fn set_quota_limit(
        &self,
        tenant_id: Uuid,
        daily_write_limit: i64,
    ) -> VigilResult<TenantUsageQuota> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let quota = state
            .quotas
            .entry(tenant_id)
            .and_modify(|q| {
                q.daily_write_limit = daily_write_limit;
                q.updated_at = now;
            })
            .or_insert(TenantUsageQuota {
                tenant_id,
                daily_write_limit,
                created_at: now,
                updated_at: now,
            })
            .clone();
        Ok(quota)
    }

    async fn sum_usage_since(
        &self,
        tenant_id: Uuid,
        metric: &str,
        since: DateTime<Utc>,
    ) -> VigilResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .events
            .iter()
            .filter(|e| e.tenant_id == tenant_id && e.metric == metric && e.created_at >= since)
            .map(|e| e.amount)
            .sum())
    }

    async fn create_usage_event(&self, input: CreateUsageEvent) -> VigilResult<UsageEvent> {
        let mut state = self.state.write().await;
        let event = UsageEvent {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            metric: input.metric,
            amount: input.amount,
            actor_user_id: input.actor_user_id,
            api_key_id: input.api_key_id,
            created_at: Utc::now(),
        };
        state.events.push(event.clone());
        Ok(event)
    }
}
