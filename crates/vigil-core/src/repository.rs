//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Tenant-scoped repositories take
//! a `tenant_id` parameter on every read and write — there is no code
//! path that touches a record by id alone without a tenant match. The
//! core must behave identically against the in-memory and any durable
//! implementation; that is the acceptance bar for the isolation
//! contract.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::cursor::{Page, PageRequest};
use crate::error::VigilResult;
use crate::models::{
    audit::{AuditLogEvent, CreateAuditLogEvent},
    incident::{
        CreateIncident, CreateIncidentTask, CreateStatusUpdate, CreateTimelineEvent, Incident,
        IncidentTask, StatusUpdate, TimelineEvent, UpdateIncident, UpdateIncidentTask,
    },
    role::{IncidentRole, OrgRole},
    service_account::{ApiKeyRecord, CreateApiKey, CreateServiceAccount, ServiceAccount},
    session::{CreateSession, Session},
    tenant::{CreateInvite, CreateTenant, Membership, Tenant, TenantInvite},
    usage::{CreateUsageEvent, TenantUsageQuota, UsageEvent},
    user::{CreateUser, PasswordResetToken, User},
};

// ---------------------------------------------------------------------------
// Users, sessions, password reset (global scope)
// ---------------------------------------------------------------------------

pub trait AuthRepository: Send + Sync {
    fn create_user(&self, input: CreateUser) -> impl Future<Output = VigilResult<User>> + Send;

    fn find_user_by_id(&self, id: Uuid) -> impl Future<Output = VigilResult<Option<User>>> + Send;

    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = VigilResult<Option<User>>> + Send;

    fn update_user_password(
        &self,
        user_id: Uuid,
        password_hash: String,
    ) -> impl Future<Output = VigilResult<()>> + Send;

    /// Increment the failure counter; lock the account when `lock_until`
    /// is supplied.
    fn record_failed_login(
        &self,
        user_id: Uuid,
        lock_until: Option<DateTime<Utc>>,
    ) -> impl Future<Output = VigilResult<()>> + Send;

    fn clear_failed_login_state(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = VigilResult<()>> + Send;

    fn create_session(
        &self,
        input: CreateSession,
    ) -> impl Future<Output = VigilResult<Session>> + Send;

    fn find_session_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = VigilResult<Option<Session>>> + Send;

    fn set_session_active_tenant(
        &self,
        session_id: Uuid,
        tenant_id: Uuid,
    ) -> impl Future<Output = VigilResult<()>> + Send;

    fn delete_session(&self, session_id: Uuid) -> impl Future<Output = VigilResult<()>> + Send;

    fn create_password_reset_token(
        &self,
        user_id: Uuid,
        token_hash: String,
        expires_at: DateTime<Utc>,
    ) -> impl Future<Output = VigilResult<PasswordResetToken>> + Send;

    /// Atomically fetch-and-delete an unexpired token by hash. Returns
    /// `None` for unknown, expired, or already-consumed tokens alike.
    fn consume_password_reset_token(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = VigilResult<Option<PasswordResetToken>>> + Send;

    /// Drop all outstanding reset tokens for a user (called after a
    /// successful reset or password change).
    fn purge_password_reset_tokens(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = VigilResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Tenants, memberships, invites
// ---------------------------------------------------------------------------

pub trait TenantRepository: Send + Sync {
    /// Create the tenant and its Owner membership in one atomic unit.
    fn create_tenant_with_owner(
        &self,
        input: CreateTenant,
        owner_user_id: Uuid,
    ) -> impl Future<Output = VigilResult<(Tenant, Membership)>> + Send;

    fn find_tenant_by_id(
        &self,
        tenant_id: Uuid,
    ) -> impl Future<Output = VigilResult<Option<Tenant>>> + Send;

    fn list_memberships_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = VigilResult<Vec<Membership>>> + Send;

    fn get_membership(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = VigilResult<Option<Membership>>> + Send;

    fn create_invite(
        &self,
        input: CreateInvite,
    ) -> impl Future<Output = VigilResult<TenantInvite>> + Send;

    fn find_invite_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = VigilResult<Option<TenantInvite>>> + Send;

    /// Mark the invite accepted and upsert the membership (overwriting
    /// any existing role) in one atomic unit.
    fn accept_invite(
        &self,
        invite_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> impl Future<Output = VigilResult<Membership>> + Send;
}

// ---------------------------------------------------------------------------
// Incidents and child records (tenant scope)
// ---------------------------------------------------------------------------

pub trait IncidentRepository: Send + Sync {
    fn create_incident(
        &self,
        input: CreateIncident,
    ) -> impl Future<Output = VigilResult<Incident>> + Send;

    /// Ordered `(created_at DESC, id DESC)`.
    fn list_incidents(
        &self,
        tenant_id: Uuid,
        page: PageRequest,
    ) -> impl Future<Output = VigilResult<Page<Incident>>> + Send;

    fn find_incident_by_id(
        &self,
        tenant_id: Uuid,
        incident_id: Uuid,
    ) -> impl Future<Output = VigilResult<Option<Incident>>> + Send;

    fn update_incident(
        &self,
        tenant_id: Uuid,
        incident_id: Uuid,
        patch: UpdateIncident,
    ) -> impl Future<Output = VigilResult<Incident>> + Send;

    /// Incident roles held by a user on one incident.
    fn incident_roles_for_user(
        &self,
        tenant_id: Uuid,
        incident_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = VigilResult<Vec<IncidentRole>>> + Send;

    fn assign_incident_role(
        &self,
        tenant_id: Uuid,
        incident_id: Uuid,
        user_id: Uuid,
        role: IncidentRole,
    ) -> impl Future<Output = VigilResult<()>> + Send;

    fn create_timeline_event(
        &self,
        input: CreateTimelineEvent,
    ) -> impl Future<Output = VigilResult<TimelineEvent>> + Send;

    fn list_timeline_events(
        &self,
        tenant_id: Uuid,
        incident_id: Uuid,
        page: PageRequest,
    ) -> impl Future<Output = VigilResult<Page<TimelineEvent>>> + Send;

    fn create_task(
        &self,
        input: CreateIncidentTask,
    ) -> impl Future<Output = VigilResult<IncidentTask>> + Send;

    fn list_tasks(
        &self,
        tenant_id: Uuid,
        incident_id: Uuid,
        page: PageRequest,
    ) -> impl Future<Output = VigilResult<Page<IncidentTask>>> + Send;

    fn find_task_by_id(
        &self,
        tenant_id: Uuid,
        task_id: Uuid,
    ) -> impl Future<Output = VigilResult<Option<IncidentTask>>> + Send;

    fn update_task(
        &self,
        tenant_id: Uuid,
        task_id: Uuid,
        patch: UpdateIncidentTask,
    ) -> impl Future<Output = VigilResult<IncidentTask>> + Send;

    fn create_status_update(
        &self,
        input: CreateStatusUpdate,
    ) -> impl Future<Output = VigilResult<StatusUpdate>> + Send;

    fn list_status_updates(
        &self,
        tenant_id: Uuid,
        incident_id: Uuid,
        page: PageRequest,
    ) -> impl Future<Output = VigilResult<Page<StatusUpdate>>> + Send;
}

// ---------------------------------------------------------------------------
// Service accounts and API keys (tenant scope)
// ---------------------------------------------------------------------------

pub trait ApiKeyRepository: Send + Sync {
    fn create_service_account(
        &self,
        input: CreateServiceAccount,
    ) -> impl Future<Output = VigilResult<ServiceAccount>> + Send;

    fn list_service_accounts(
        &self,
        tenant_id: Uuid,
    ) -> impl Future<Output = VigilResult<Vec<ServiceAccount>>> + Send;

    fn find_service_account_by_id(
        &self,
        tenant_id: Uuid,
        service_account_id: Uuid,
    ) -> impl Future<Output = VigilResult<Option<ServiceAccount>>> + Send;

    fn create_api_key(
        &self,
        input: CreateApiKey,
    ) -> impl Future<Output = VigilResult<ApiKeyRecord>> + Send;

    fn list_api_keys(
        &self,
        tenant_id: Uuid,
    ) -> impl Future<Output = VigilResult<Vec<ApiKeyRecord>>> + Send;

    fn find_api_key_by_id(
        &self,
        tenant_id: Uuid,
        api_key_id: Uuid,
    ) -> impl Future<Output = VigilResult<Option<ApiKeyRecord>>> + Send;

    fn revoke_api_key(
        &self,
        tenant_id: Uuid,
        api_key_id: Uuid,
    ) -> impl Future<Output = VigilResult<Option<ApiKeyRecord>>> + Send;

    /// Lookup by secret hash, skipping revoked rows — revoked and
    /// unknown keys are indistinguishable here.
    fn find_active_api_key_by_hash(
        &self,
        secret_hash: &str,
    ) -> impl Future<Output = VigilResult<Option<ApiKeyRecord>>> + Send;

    fn mark_api_key_used(
        &self,
        api_key_id: Uuid,
        at: DateTime<Utc>,
    ) -> impl Future<Output = VigilResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Usage quotas
// ---------------------------------------------------------------------------

pub trait UsageRepository: Send + Sync {
    /// Fetch the tenant's quota, creating it with `default_limit` on
    /// first use.
    fn get_or_create_quota(
        &self,
        tenant_id: Uuid,
        default_limit: i64,
    ) -> impl Future<Output = VigilResult<TenantUsageQuota>> + Send;

    fn set_quota_limit(
        &self,
        tenant_id: Uuid,
        daily_write_limit: i64,
    ) -> impl Future<Output = VigilResult<TenantUsageQuota>> + Send;

    /// `sum(amount)` over events for `(tenant, metric)` with
    /// `created_at >= since`.
    fn sum_usage_since(
        &self,
        tenant_id: Uuid,
        metric: &str,
        since: DateTime<Utc>,
    ) -> impl Future<Output = VigilResult<i64>> + Send;

    fn create_usage_event(
        &self,
        input: CreateUsageEvent,
    ) -> impl Future<Output = VigilResult<UsageEvent>> + Send;
}

// ---------------------------------------------------------------------------
// Audit log
// ---------------------------------------------------------------------------

pub trait AuditLogRepository: Send + Sync {
    fn create_event(
        &self,
        input: CreateAuditLogEvent,
    ) -> impl Future<Output = VigilResult<AuditLogEvent>> + Send;

    /// Ordered `(created_at DESC, id DESC)`.
    fn list_events(
        &self,
        tenant_id: Uuid,
        page: PageRequest,
    ) -> impl Future<Output = VigilResult<Page<AuditLogEvent>>> + Send;
}
