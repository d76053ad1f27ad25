//! Tenant service — creation, context switching, invites.

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;
use vigil_core::error::{VigilError, VigilResult};
use vigil_core::models::role::OrgRole;
use vigil_core::models::tenant::{CreateInvite, CreateTenant, Membership, Tenant, TenantInvite};
use vigil_core::policy::{Action, assert_authorized};
use vigil_core::principal::Principal;
use vigil_core::repository::{AuditLogRepository, AuthRepository, TenantRepository};

use crate::audit::{AuditSink, AuditTarget, email_domain, tenant_event};
use crate::config::ServiceConfig;
use crate::guard::TenantIsolationGuard;

/// A freshly created invite plus the raw token to deliver to the
/// invitee. The token is never stored.
#[derive(Debug)]
pub struct InviteOutput {
    pub invite: TenantInvite,
    pub raw_token: String,
}

pub struct TenantService<T, A, L>
where
    T: TenantRepository,
    A: AuthRepository,
    L: AuditLogRepository,
{
    tenant_repo: T,
    auth_repo: A,
    guard: TenantIsolationGuard<T>,
    sink: AuditSink<L>,
    config: ServiceConfig,
}

impl<T, A, L> TenantService<T, A, L>
where
    T: TenantRepository + Clone,
    A: AuthRepository,
    L: AuditLogRepository,
{
    pub fn new(tenant_repo: T, auth_repo: A, audit_repo: L, config: ServiceConfig) -> Self {
        Self {
            guard: TenantIsolationGuard::new(tenant_repo.clone()),
            tenant_repo,
            auth_repo,
            sink: AuditSink::new(audit_repo),
            config,
        }
    }

    /// Create a tenant; the caller becomes its Owner.
    pub async fn create_tenant(
        &self,
        principal: &Principal,
        name: &str,
        slug: &str,
    ) -> VigilResult<(Tenant, Membership)> {
        let name = name.trim();
        let slug = slug.trim();
        if name.is_empty() {
            return Err(VigilError::validation("tenant name must not be empty"));
        }
        if slug.is_empty()
            || !slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(VigilError::validation(
                "slug must be lowercase alphanumeric with dashes",
            ));
        }

        let (tenant, membership) = self
            .tenant_repo
            .create_tenant_with_owner(
                CreateTenant {
                    name: name.to_owned(),
                    slug: slug.to_owned(),
                },
                principal.user_id,
            )
            .await?;

        self.sink
            .record_safely(tenant_event(
                tenant.id,
                principal.user_id,
                "tenant.create",
                AuditTarget {
                    target_type: "tenant",
                    target_id: tenant.id,
                },
                json!({ "slug": tenant.slug }),
            ))
            .await;

        Ok((tenant, membership))
    }

    /// All tenants the caller belongs to.
    pub async fn list_memberships(&self, principal: &Principal) -> VigilResult<Vec<Membership>> {
        self.tenant_repo
            .list_memberships_for_user(principal.user_id)
            .await
    }

    /// Switch the session's active tenant.
    ///
    /// Requires an existing membership; switching into a tenant the
    /// caller does not belong to is NotFound, never Forbidden, so the
    /// tenant's existence is not confirmed to non-members. API-key
    /// principals are bound to one tenant and cannot switch.
    pub async fn switch_tenant(
        &self,
        principal: &Principal,
        tenant_id: Uuid,
    ) -> VigilResult<Membership> {
        principal.require_session()?;
        let membership = self
            .guard
            .require_membership(tenant_id, principal.user_id)
            .await?;

        let session_id = principal
            .session_id
            .ok_or(VigilError::AuthenticationRequired)?;
        self.auth_repo
            .set_session_active_tenant(session_id, tenant_id)
            .await?;

        self.sink
            .record_safely(tenant_event(
                tenant_id,
                principal.user_id,
                "tenant.switch",
                AuditTarget {
                    target_type: "tenant",
                    target_id: tenant_id,
                },
                json!({}),
            ))
            .await;

        Ok(membership)
    }

    /// Invite an email into the active tenant with a role.
    pub async fn invite_member(
        &self,
        principal: &Principal,
        email: &str,
        role: OrgRole,
    ) -> VigilResult<InviteOutput> {
        let ctx = self.guard.resolve(principal).await?;
        assert_authorized(Action::MembersInvite, &ctx.subject, None)?;

        let email = email.trim().to_ascii_lowercase();
        if email.split_once('@').is_none_or(|(l, d)| l.is_empty() || d.is_empty()) {
            return Err(VigilError::validation("invalid email address"));
        }

        let raw_token = vigil_auth::token::generate_token();
        let invite = self
            .tenant_repo
            .create_invite(CreateInvite {
                tenant_id: ctx.tenant_id,
                email: email.clone(),
                role,
                token_hash: vigil_auth::token::hash_token(&raw_token),
                expires_at: Utc::now() + Duration::seconds(self.config.invite_lifetime_secs as i64),
            })
            .await?;

        self.sink
            .record_safely(tenant_event(
                ctx.tenant_id,
                principal.user_id,
                "member.invite",
                AuditTarget {
                    target_type: "tenant_invite",
                    target_id: invite.id,
                },
                json!({ "email_domain": email_domain(&email), "role": role.as_str() }),
            ))
            .await;

        Ok(InviteOutput { invite, raw_token })
    }

    /// Accept an invite with its raw token.
    ///
    /// Valid only while unaccepted and unexpired, and only for the user
    /// whose email matches the invite (case-insensitive). All failure
    /// modes share one message so the endpoint leaks nothing about
    /// which check failed.
    pub async fn accept_invite(
        &self,
        principal: &Principal,
        raw_token: &str,
    ) -> VigilResult<Membership> {
        principal.require_session()?;
        let invalid = || VigilError::validation("invite is not valid");

        let invite = self
            .tenant_repo
            .find_invite_by_token_hash(&vigil_auth::token::hash_token(raw_token))
            .await?
            .ok_or_else(invalid)?;

        if invite.accepted_at.is_some() || invite.expires_at <= Utc::now() {
            return Err(invalid());
        }

        let user = self
            .auth_repo
            .find_user_by_id(principal.user_id)
            .await?
            .ok_or(VigilError::AuthenticationRequired)?;
        if !user.email.eq_ignore_ascii_case(&invite.email) {
            return Err(invalid());
        }

        let membership = self
            .tenant_repo
            .accept_invite(invite.id, user.id, invite.role)
            .await?;

        self.sink
            .record_safely(tenant_event(
                invite.tenant_id,
                user.id,
                "member.invite_accepted",
                AuditTarget {
                    target_type: "tenant_invite",
                    target_id: invite.id,
                },
                json!({ "role": invite.role.as_str() }),
            ))
            .await;

        Ok(membership)
    }
}
