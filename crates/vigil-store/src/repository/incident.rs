//! In-memory implementation of [`IncidentRepository`].
//!
//! Every lookup and mutation filters by `tenant_id` before touching the
//! record — a foreign-tenant id behaves exactly like an absent one.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;
use vigil_core::cursor::{Page, PageRequest};
use vigil_core::error::{VigilError, VigilResult};
use vigil_core::models::incident::{
    CreateIncident, CreateIncidentTask, CreateStatusUpdate, CreateTimelineEvent, Incident,
    IncidentStatus, IncidentTask, StatusUpdate, TaskStatus, TimelineEvent, UpdateIncident,
    UpdateIncidentTask,
};
use vigil_core::models::role::IncidentRole;
use vigil_core::repository::IncidentRepository;

use super::paginate;

#[derive(Default)]
struct IncidentState {
    incidents: HashMap<Uuid, Incident>,
    timeline: Vec<TimelineEvent>,
    tasks: HashMap<Uuid, IncidentTask>,
    updates: Vec<StatusUpdate>,
    /// (tenant, incident, user) → roles.
    roles: HashMap<(Uuid, Uuid, Uuid), Vec<IncidentRole>>,
}

#[derive(Clone, Default)]
pub struct MemIncidentRepository {
    state: Arc<RwLock<IncidentState>>,
}

impl MemIncidentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IncidentRepository for MemIncidentRepository {
    async fn create_incident(&self, input: CreateIncident) -> VigilResult<Incident> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let incident = Incident {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            title: input.title,
            description: input.description,
            severity: input.severity,
            status: IncidentStatus::Declared,
            start_time: input.start_time,
            end_time: None,
            impacted_services: input.impacted_services,
            created_at: now,
            updated_at: now,
        };
        state.incidents.insert(incident.id, incident.clone());
        Ok(incident)
    }

    async fn list_incidents(
        &self,
        tenant_id: Uuid,
        page: PageRequest,
    ) -> VigilResult<Page<Incident>> {
        let state = self.state.read().await;
        let rows: Vec<Incident> = state
            .incidents
            .values()
            .filter(|i| i.tenant_id == tenant_id)
            .cloned()
            .collect();
        Ok(paginate(&rows, page, |i| (i.created_at, i.id)))
    }

    async fn find_incident_by_id(
        &self,
        tenant_id: Uuid,
        incident_id: Uuid,
    ) -> VigilResult<Option<Incident>> {
        Ok(self
            .state
            .read()
            .await
            .incidents
            .get(&incident_id)
            .filter(|i| i.tenant_id == tenant_id)
            .cloned())
    }

    async fn update_incident(
        &self,
        tenant_id: Uuid,
        incident_id: Uuid,
        patch: UpdateIncident,
    ) -> VigilResult<Incident> {
        let mut state = self.state.write().await;
        let incident = state
            .incidents
            .get_mut(&incident_id)
            .filter(|i| i.tenant_id == tenant_id)
            .ok_or_else(|| VigilError::not_found("incident"))?;

        if let Some(title) = patch.title {
            incident.title = title;
        }
        if let Some(description) = patch.description {
            incident.description = description;
        }
        if let Some(severity) = patch.severity {
            incident.severity = severity;
        }
        if let Some(status) = patch.status {
            incident.status = status;
        }
        if let Some(end_time) = patch.end_time {
            incident.end_time = Some(end_time);
        }
        if let Some(services) = patch.impacted_services {
            incident.impacted_services = services;
        }
        incident.updated_at = Utc::now();
        Ok(incident.clone())
    }

    async fn incident_roles_for_user(
        &self,
        tenant_id: Uuid,
        incident_id: Uuid,
        user_id: Uuid,
    ) -> VigilResult<Vec<IncidentRole>> {
        Ok(self
            .state
            .read()
            .await
            .roles
            .get(&(tenant_id, incident_id, user_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn assign_incident_role(
        &self,
        tenant_id: Uuid,
        incident_id: Uuid,
        user_id: Uuid,
        role: IncidentRole,
    ) -> VigilResult<()> {
        let mut state = self.state.write().await;
        if !state
            .incidents
            .get(&incident_id)
            .is_some_and(|i| i.tenant_id == tenant_id)
        {
            return Err(VigilError::not_found("incident"));
        }
        let roles = state
            .roles
            .entry((tenant_id, incident_id, user_id))
            .or_default();
        if !roles.contains(&role) {
            roles.push(role);
        }
        Ok(())
    }

    async fn create_timeline_event(
        &self,
        input: CreateTimelineEvent,
    ) -> VigilResult<TimelineEvent> {
        let mut state = self.state.write().await;
        let event = TimelineEvent {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            incident_id: input.incident_id,
            author_user_id: input.author_user_id,
            message: input.message,
            occurred_at: input.occurred_at,
            created_at: Utc::now(),
        };
        state.timeline.push(event.clone());
        Ok(event)
    }

    async fn list_timeline_events(
        &self,
        tenant_id: Uuid,
        incident_id: Uuid,
        page: PageRequest,
    ) -> VigilResult<Page<TimelineEvent>> {
        let state = self.state.read().await;
        let rows: Vec<TimelineEvent> = state
            .timeline
            .iter()
            .filter(|e| e.tenant_id == tenant_id && e.incident_id == incident_id)
            .cloned()
            .collect();
        Ok(paginate(&rows, page, |e| (e.created_at, e.id)))
    }

    async fn create_task(&self, input: CreateIncidentTask) -> VigilResult<IncidentTask> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let task = IncidentTask {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            incident_id: input.incident_id,
            title: input.title,
            status: TaskStatus::Open,
            assignee_user_id: input.assignee_user_id,
            due_at: input.due_at,
            created_at: now,
            updated_at: now,
        };
        state.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn list_tasks(
        &self,
        tenant_id: Uuid,
        incident_id: Uuid,
        page: PageRequest,
    ) -> VigilResult<Page<IncidentTask>> {
        let state = self.state.read().await;
        let rows: Vec<IncidentTask> = state
            .tasks
            .values()
            .filter(|t| t.tenant_id == tenant_id && t.incident_id == incident_id)
            .cloned()
            .collect();
        Ok(paginate(&rows, page, |t| (t.created_at, t.id)))
    }

    async fn find_task_by_id(
        &self,
        tenant_id: Uuid,
        task_id: Uuid,
    ) -> VigilResult<Option<IncidentTask>> {
        Ok(self
            .state
            .read()
            .await
            .tasks
            .get(&task_id)
            .filter(|t| t.tenant_id == tenant_id)
            .cloned())
    }

    async fn update_task(
        &self,
        tenant_id: Uuid,
        task_id: Uuid,
        patch: UpdateIncidentTask,
    ) -> VigilResult<IncidentTask> {
        let mut state = self.state.write().await;
        let task = state
            .tasks
            .get_mut(&task_id)
            .filter(|t| t.tenant_id == tenant_id)
            .ok_or_else(|| VigilError::not_found("task"))?;

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(assignee) = patch.assignee_user_id {
            task.assignee_user_id = assignee;
        }
        if let Some(due_at) = patch.due_at {
            task.due_at = due_at;
        }
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn create_status_update(&self, input: CreateStatusUpdate) -> VigilResult<StatusUpdate> {
        let mut state = self.state.write().await;
        let update = StatusUpdate {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            incident_id: input.incident_id,
            author_user_id: input.author_user_id,
            audience: input.audience,
            body: input.body,
            created_at: Utc::now(),
        };
        state.updates.push(update.clone());
        Ok(update)
    }

    async fn list_status_updates(
        &self,
        tenant_id: Uuid,
        incident_id: Uuid,
        page: PageRequest,
    ) -> VigilResult<Page<StatusUpdate>> {
        let state = self.state.read().await;
        let rows: Vec<StatusUpdate> = state
            .updates
            .iter()
            .filter(|u| u.tenant_id == tenant_id && u.incident_id == incident_id)
            .cloned()
            .collect();
        Ok(paginate(&rows, page, |u| (u.created_at, u.id)))
    }
}
