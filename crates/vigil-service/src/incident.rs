//! Incident service — declaration, lifecycle updates, timeline, tasks,
//! and status updates.
//!
//! Every operation follows the same discipline: resolve the caller's
//! tenant standing, confirm the target exists within that tenant, then
//! evaluate policy, then (for mutations) consume write quota, then
//! perform the domain write, then record audit fire-and-forget.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;
use vigil_core::cursor::{Page, PageRequest};
use vigil_core::error::VigilResult;
use vigil_core::lifecycle;
use vigil_core::models::incident::{
    CreateIncident, CreateIncidentTask, CreateStatusUpdate, CreateTimelineEvent, Incident,
    IncidentStatus, IncidentTask, Severity, StatusUpdate, TimelineEvent, UpdateAudience,
    UpdateIncident, UpdateIncidentTask,
};
use vigil_core::models::role::IncidentRole;
use vigil_core::policy::{Action, ResourceContext, assert_authorized};
use vigil_core::principal::Principal;
use vigil_core::repository::{
    AuditLogRepository, IncidentRepository, TenantRepository, UsageRepository,
};

use crate::audit::{AuditSink, AuditTarget, tenant_event};
use crate::config::ServiceConfig;
use crate::guard::{GuardedContext, TenantIsolationGuard, found};
use crate::quota::UsageQuotaLimiter;

/// Input for declaring a new incident.
#[derive(Debug, Clone)]
pub struct DeclareIncident {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub start_time: DateTime<Utc>,
    pub impacted_services: Vec<String>,
}

/// Caller-facing incident patch. `None` fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct IncidentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<Severity>,
    pub status: Option<IncidentStatus>,
    pub impacted_services: Option<Vec<String>>,
}

/// Trim, drop empties, deduplicate.
fn normalize_services(raw: Vec<String>) -> BTreeSet<String> {
    raw.into_iter()
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect()
}

pub struct IncidentService<I, T, U, L>
where
    I: IncidentRepository,
    T: TenantRepository,
    U: UsageRepository,
    L: AuditLogRepository,
{
    incident_repo: I,
    guard: TenantIsolationGuard<T>,
    quota: UsageQuotaLimiter<U>,
    sink: AuditSink<L>,
}

impl<I, T, U, L> IncidentService<I, T, U, L>
where
    I: IncidentRepository,
    T: TenantRepository,
    U: UsageRepository,
    L: AuditLogRepository,
{
    pub fn new(
        incident_repo: I,
        tenant_repo: T,
        usage_repo: U,
        audit_repo: L,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            incident_repo,
            guard: TenantIsolationGuard::new(tenant_repo),
            quota: UsageQuotaLimiter::new(usage_repo, config),
            sink: AuditSink::new(audit_repo),
        }
    }

    /// Existence check scoped to the caller's tenant, then incident-role
    /// context for the policy evaluation that follows.
    async fn load_incident(
        &self,
        ctx: &GuardedContext,
        incident_id: Uuid,
    ) -> VigilResult<(Incident, ResourceContext)> {
        let incident = found(
            self.incident_repo
                .find_incident_by_id(ctx.tenant_id, incident_id)
                .await?,
            "incident",
        )?;
        let roles = self
            .incident_repo
            .incident_roles_for_user(ctx.tenant_id, incident_id, ctx.subject.user_id)
            .await?;
        Ok((
            incident,
            ResourceContext {
                incident_roles: roles.into_iter().collect(),
            },
        ))
    }

    /// Declare a new incident in the active tenant. The declaring user
    /// becomes its commander.
    pub async fn declare(
        &self,
        principal: &Principal,
        input: DeclareIncident,
    ) -> VigilResult<Incident> {
        let ctx = self.guard.resolve(principal).await?;
        assert_authorized(Action::IncidentsCreate, &ctx.subject, None)?;

        if input.title.trim().is_empty() {
            return Err(vigil_core::VigilError::validation(
                "incident title must not be empty",
            ));
        }

        self.quota.consume_write(ctx.tenant_id, principal).await?;

        let incident = self
            .incident_repo
            .create_incident(CreateIncident {
                tenant_id: ctx.tenant_id,
                title: input.title.trim().to_owned(),
                description: input.description,
                severity: input.severity,
                start_time: input.start_time,
                impacted_services: normalize_services(input.impacted_services),
            })
            .await?;

        self.incident_repo
            .assign_incident_role(
                ctx.tenant_id,
                incident.id,
                principal.user_id,
                IncidentRole::Commander,
            )
            .await?;

        self.sink
            .record_safely(tenant_event(
                ctx.tenant_id,
                principal.user_id,
                "incident.declare",
                AuditTarget {
                    target_type: "incident",
                    target_id: incident.id,
                },
                json!({ "severity": incident.severity.to_string() }),
            ))
            .await;

        Ok(incident)
    }

    pub async fn list(
        &self,
        principal: &Principal,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> VigilResult<Page<Incident>> {
        let ctx = self.guard.resolve(principal).await?;
        assert_authorized(Action::IncidentsRead, &ctx.subject, None)?;
        let page = PageRequest::from_raw(limit, cursor)?;
        self.incident_repo.list_incidents(ctx.tenant_id, page).await
    }

    pub async fn get(&self, principal: &Principal, incident_id: Uuid) -> VigilResult<Incident> {
        let ctx = self.guard.resolve(principal).await?;
        let (incident, _) = self.load_incident(&ctx, incident_id).await?;
        assert_authorized(Action::IncidentsRead, &ctx.subject, None)?;
        Ok(incident)
    }

    /// Apply a patch to an incident.
    ///
    /// Status changes go through the lifecycle table; entering Resolved
    /// or Closed demands the stronger resolve permission, and severity
    /// changes their own permission — both in addition to the base
    /// update permission.
    pub async fn update(
        &self,
        principal: &Principal,
        incident_id: Uuid,
        patch: IncidentPatch,
    ) -> VigilResult<Incident> {
        let ctx = self.guard.resolve(principal).await?;
        let (incident, resource) = self.load_incident(&ctx, incident_id).await?;

        assert_authorized(Action::IncidentsUpdate, &ctx.subject, Some(&resource))?;

        if patch
            .severity
            .is_some_and(|severity| severity != incident.severity)
        {
            assert_authorized(Action::IncidentsChangeSeverity, &ctx.subject, Some(&resource))?;
        }

        let mut end_time = None;
        if let Some(target) = patch.status {
            lifecycle::validate_transition(incident.status, target)?;
            if let Some(extra) = lifecycle::extra_permission_for(target) {
                if target != incident.status {
                    assert_authorized(extra, &ctx.subject, Some(&resource))?;
                }
            }
            if target == IncidentStatus::Resolved && incident.end_time.is_none() {
                end_time = Some(Utc::now());
            }
        }

        self.quota.consume_write(ctx.tenant_id, principal).await?;

        let updated = self
            .incident_repo
            .update_incident(
                ctx.tenant_id,
                incident_id,
                UpdateIncident {
                    title: patch.title,
                    description: patch.description,
                    severity: patch.severity,
                    status: patch.status,
                    end_time,
                    impacted_services: patch.impacted_services.map(normalize_services),
                },
            )
            .await?;

        self.sink
            .record_safely(tenant_event(
                ctx.tenant_id,
                principal.user_id,
                "incident.update",
                AuditTarget {
                    target_type: "incident",
                    target_id: incident_id,
                },
                json!({ "status": updated.status.as_str() }),
            ))
            .await;

        Ok(updated)
    }

    /// Grant an incident role to a member.
    pub async fn assign_role(
        &self,
        principal: &Principal,
        incident_id: Uuid,
        user_id: Uuid,
        role: IncidentRole,
    ) -> VigilResult<()> {
        let ctx = self.guard.resolve(principal).await?;
        let (_, resource) = self.load_incident(&ctx, incident_id).await?;
        assert_authorized(Action::IncidentsUpdate, &ctx.subject, Some(&resource))?;
        self.guard.require_membership(ctx.tenant_id, user_id).await?;
        self.incident_repo
            .assign_incident_role(ctx.tenant_id, incident_id, user_id, role)
            .await?;

        self.sink
            .record_safely(tenant_event(
                ctx.tenant_id,
                principal.user_id,
                "incident.role_assigned",
                AuditTarget {
                    target_type: "incident",
                    target_id: incident_id,
                },
                json!({ "role": role.as_str() }),
            ))
            .await;

        Ok(())
    }

    // -- timeline ----------------------------------------------------------

    pub async fn append_timeline(
        &self,
        principal: &Principal,
        incident_id: Uuid,
        message: &str,
        occurred_at: DateTime<Utc>,
    ) -> VigilResult<TimelineEvent> {
        let ctx = self.guard.resolve(principal).await?;
        let (_, resource) = self.load_incident(&ctx, incident_id).await?;
        assert_authorized(Action::TimelineAppend, &ctx.subject, Some(&resource))?;

        self.quota.consume_write(ctx.tenant_id, principal).await?;

        let event = self
            .incident_repo
            .create_timeline_event(CreateTimelineEvent {
                tenant_id: ctx.tenant_id,
                incident_id,
                author_user_id: Some(principal.user_id),
                message: message.to_owned(),
                occurred_at,
            })
            .await?;

        self.sink
            .record_safely(tenant_event(
                ctx.tenant_id,
                principal.user_id,
                "incident.timeline_appended",
                AuditTarget {
                    target_type: "timeline_event",
                    target_id: event.id,
                },
                json!({}),
            ))
            .await;

        Ok(event)
    }

    pub async fn list_timeline(
        &self,
        principal: &Principal,
        incident_id: Uuid,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> VigilResult<Page<TimelineEvent>> {
        let ctx = self.guard.resolve(principal).await?;
        let (_, _) = self.load_incident(&ctx, incident_id).await?;
        assert_authorized(Action::TimelineRead, &ctx.subject, None)?;
        let page = PageRequest::from_raw(limit, cursor)?;
        self.incident_repo
            .list_timeline_events(ctx.tenant_id, incident_id, page)
            .await
    }

    // -- tasks -------------------------------------------------------------

    pub async fn create_task(
        &self,
        principal: &Principal,
        incident_id: Uuid,
        title: &str,
        assignee_user_id: Option<Uuid>,
        due_at: Option<DateTime<Utc>>,
    ) -> VigilResult<IncidentTask> {
        let ctx = self.guard.resolve(principal).await?;
        let (_, resource) = self.load_incident(&ctx, incident_id).await?;
        assert_authorized(Action::TasksCreate, &ctx.subject, Some(&resource))?;

        self.quota.consume_write(ctx.tenant_id, principal).await?;

        let task = self
            .incident_repo
            .create_task(CreateIncidentTask {
                tenant_id: ctx.tenant_id,
                incident_id,
                title: title.to_owned(),
                assignee_user_id,
                due_at,
            })
            .await?;

        self.sink
            .record_safely(tenant_event(
                ctx.tenant_id,
                principal.user_id,
                "incident.task_created",
                AuditTarget {
                    target_type: "incident_task",
                    target_id: task.id,
                },
                json!({}),
            ))
            .await;

        Ok(task)
    }

    pub async fn list_tasks(
        &self,
        principal: &Principal,
        incident_id: Uuid,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> VigilResult<Page<IncidentTask>> {
        let ctx = self.guard.resolve(principal).await?;
        let (_, _) = self.load_incident(&ctx, incident_id).await?;
        assert_authorized(Action::TasksRead, &ctx.subject, None)?;
        let page = PageRequest::from_raw(limit, cursor)?;
        self.incident_repo
            .list_tasks(ctx.tenant_id, incident_id, page)
            .await
    }

    pub async fn update_task(
        &self,
        principal: &Principal,
        task_id: Uuid,
        patch: UpdateIncidentTask,
    ) -> VigilResult<IncidentTask> {
        let ctx = self.guard.resolve(principal).await?;
        let task = found(
            self.incident_repo
                .find_task_by_id(ctx.tenant_id, task_id)
                .await?,
            "task",
        )?;
        let roles = self
            .incident_repo
            .incident_roles_for_user(ctx.tenant_id, task.incident_id, principal.user_id)
            .await?;
        let resource = ResourceContext {
            incident_roles: roles.into_iter().collect(),
        };
        assert_authorized(Action::TasksUpdate, &ctx.subject, Some(&resource))?;

        self.quota.consume_write(ctx.tenant_id, principal).await?;

        let task = self
            .incident_repo
            .update_task(ctx.tenant_id, task_id, patch)
            .await?;

        self.sink
            .record_safely(tenant_event(
                ctx.tenant_id,
                principal.user_id,
                "incident.task_updated",
                AuditTarget {
                    target_type: "incident_task",
                    target_id: task.id,
                },
                json!({}),
            ))
            .await;

        Ok(task)
    }

    // -- status updates ----------------------------------------------------

    /// Publish a status update. The required permission depends on the
    /// audience: external updates are the narrowest gate in the policy
    /// table.
    pub async fn publish_update(
        &self,
        principal: &Principal,
        incident_id: Uuid,
        audience: UpdateAudience,
        body: &str,
    ) -> VigilResult<StatusUpdate> {
        let ctx = self.guard.resolve(principal).await?;
        let (_, resource) = self.load_incident(&ctx, incident_id).await?;

        let action = match audience {
            UpdateAudience::Internal => Action::UpdatesPublishInternal,
            UpdateAudience::External => Action::UpdatesPublishExternal,
        };
        assert_authorized(action, &ctx.subject, Some(&resource))?;

        self.quota.consume_write(ctx.tenant_id, principal).await?;

        let update = self
            .incident_repo
            .create_status_update(CreateStatusUpdate {
                tenant_id: ctx.tenant_id,
                incident_id,
                author_user_id: Some(principal.user_id),
                audience,
                body: body.to_owned(),
            })
            .await?;

        self.sink
            .record_safely(tenant_event(
                ctx.tenant_id,
                principal.user_id,
                "incident.status_update_published",
                AuditTarget {
                    target_type: "status_update",
                    target_id: update.id,
                },
                json!({ "audience": match audience {
                    UpdateAudience::Internal => "internal",
                    UpdateAudience::External => "external",
                } }),
            ))
            .await;

        Ok(update)
    }

    pub async fn list_updates(
        &self,
        principal: &Principal,
        incident_id: Uuid,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> VigilResult<Page<StatusUpdate>> {
        let ctx = self.guard.resolve(principal).await?;
        let (_, _) = self.load_incident(&ctx, incident_id).await?;
        assert_authorized(Action::UpdatesRead, &ctx.subject, None)?;
        let page = PageRequest::from_raw(limit, cursor)?;
        self.incident_repo
            .list_status_updates(ctx.tenant_id, incident_id, page)
            .await
    }
}
