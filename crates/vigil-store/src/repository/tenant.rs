//! In-memory implementation of [`TenantRepository`].
//!
//! `create_tenant_with_owner` and `accept_invite` each take the write
//! lock once, so their multi-record writes are atomic with respect to
//! other repository calls — the in-memory equivalent of the store-level
//! transaction the trait contract requires.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;
use vigil_core::error::{VigilError, VigilResult};
use vigil_core::models::role::OrgRole;
use vigil_core::models::tenant::{
    CreateInvite, CreateTenant, Membership, Tenant, TenantInvite,
};
use vigil_core::repository::TenantRepository;

#[derive(Default)]
struct TenantState {
    tenants: HashMap<Uuid, Tenant>,
    /// Keyed by (tenant, user) — the unique-membership constraint.
    memberships: HashMap<(Uuid, Uuid), Membership>,
    invites: HashMap<Uuid, TenantInvite>,
}

#[derive(Clone, Default)]
pub struct MemTenantRepository {
    state: Arc<RwLock<TenantState>>,
}

impl MemTenantRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TenantRepository for MemTenantRepository {
    async fn create_tenant_with_owner(
        &self,
        input: CreateTenant,
        owner_user_id: Uuid,
    ) -> VigilResult<(Tenant, Membership)> {
        let mut state = self.state.write().await;
        if state.tenants.values().any(|t| t.slug == input.slug) {
            return Err(VigilError::validation("tenant slug already in use"));
        }
        let now = Utc::now();
        let tenant = Tenant {
            id: Uuid::new_v4(),
            name: input.name,
            slug: input.slug,
            created_at: now,
            updated_at: now,
        };
        let membership = Membership {
            tenant_id: tenant.id,
            user_id: owner_user_id,
            role: OrgRole::Owner,
            created_at: now,
            updated_at: now,
        };
        state.tenants.insert(tenant.id, tenant.clone());
        state
            .memberships
            .insert((tenant.id, owner_user_id), membership.clone());
        Ok((tenant, membership))
    }

    async fn find_tenant_by_id(&self, tenant_id: Uuid) -> VigilResult<Option<Tenant>> {
        Ok(self.state.read().await.tenants.get(&tenant_id).cloned())
    }

    async fn list_memberships_for_user(&self, user_id: Uuid) -> VigilResult<Vec<Membership>> {
        let state = self.state.read().await;
        let mut rows: Vec<Membership> = state
            .memberships
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.created_at);
        Ok(rows)
    }

    async fn get_membership(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> VigilResult<Option<Membership>> {
        Ok(self
            .state
            .read()
            .await
            .memberships
            .get(&(tenant_id, user_id))
            .cloned())
    }

    async fn create_invite(&self, input: CreateInvite) -> VigilResult<TenantInvite> {
        let mut state = self.state.write().await;
        if !state.tenants.contains_key(&input.tenant_id) {
            return Err(VigilError::not_found("tenant"));
        }
        let invite = TenantInvite {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            email: input.email,
            role: input.role,
            token_hash: input.token_hash,
            expires_at: input.expires_at,
            accepted_at: None,
            accepted_by_user_id: None,
            created_at: Utc::now(),
        };
        state.invites.insert(invite.id, invite.clone());
        Ok(invite)
    }

    async fn find_invite_by_token_hash(
        &self,
        token_hash: &str,
    ) -> VigilResult<Option<TenantInvite>> {
        Ok(self
            .state
            .read()
            .await
            .invites
            .values()
            .find(|i| i.token_hash == token_hash)
            .cloned())
    }

    async fn accept_invite(
        &self,
        invite_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> VigilResult<Membership> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        let invite = state
            .invites
            .get_mut(&invite_id)
            .ok_or_else(|| VigilError::not_found("invite"))?;
        if invite.accepted_at.is_some() {
            return Err(VigilError::validation("invite already accepted"));
        }
        invite.accepted_at = Some(now);
        invite.accepted_by_user_id = Some(user_id);
        let tenant_id = invite.tenant_id;

        // Upsert: acceptance overwrites any existing role.
        let membership = state
            .memberships
            .entry((tenant_id, user_id))
            .and_modify(|m| {
                m.role = role;
                m.updated_at = now;
            })
            .or_insert(Membership {
                tenant_id,
                user_id,
                role,
                created_at: now,
                updated_at: now,
            })
            .clone();
        Ok(membership)
    }
}
