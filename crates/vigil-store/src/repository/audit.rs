//! In-memory implementation of [`AuditLogRepository`]. Append-only.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;
use vigil_core::cursor::{Page, PageRequest};
use vigil_core::error::VigilResult;
use vigil_core::models::audit::{AuditLogEvent, CreateAuditLogEvent};
use vigil_core::repository::AuditLogRepository;

use super::paginate;

#[derive(Clone, Default)]
pub struct MemAuditLogRepository {
    events: Arc<RwLock<Vec<AuditLogEvent>>>,
}

impl MemAuditLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: all recorded events, oldest first.
    pub async fn all_events(&self) -> Vec<AuditLogEvent> {
        self.events.read().await.clone()
    }
}

impl AuditLogRepository for MemAuditLogRepository {
    async fn create_event(&self, input: CreateAuditLogEvent) -> VigilResult<AuditLogEvent> {
        let event = AuditLogEvent {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            actor_user_id: input.actor_user_id,
            action: input.action,
            target_type: input.target_type,
            target_id: input.target_id,
            metadata: input.metadata,
            trace_id: input.trace_id,
            created_at: Utc::now(),
        };
        self.events.write().await.push(event.clone());
        Ok(event)
    }

    async fn list_events(
        &self,
        tenant_id: Uuid,
        page: PageRequest,
    ) -> VigilResult<Page<AuditLogEvent>> {
        let events = self.events.read().await;
        let rows: Vec<AuditLogEvent> = events
            .iter()
            .filter(|e| e.tenant_id == Some(tenant_id))
            .cloned()
            .collect();
        Ok(paginate(&rows, page, |e| (e.created_at, e.id)))
    }
}
