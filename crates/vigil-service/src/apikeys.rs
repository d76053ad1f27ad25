//! Service-account and API-key management.
//!
//! Every operation here requires a session principal: a leaked API key
//! must not be able to inspect, mint, or revoke credentials.

use std::collections::BTreeSet;

use serde_json::json;
use uuid::Uuid;
use vigil_core::error::{VigilError, VigilResult};
use vigil_core::models::service_account::{
    ApiKeyRecord, CreateApiKey, CreateServiceAccount, KeyScope, ServiceAccount,
};
use vigil_core::policy::{Action, assert_authorized};
use vigil_core::principal::Principal;
use vigil_core::repository::{ApiKeyRepository, AuditLogRepository, TenantRepository};

use crate::audit::{AuditSink, AuditTarget, tenant_event};
use crate::guard::{TenantIsolationGuard, found};

/// A freshly minted key plus the raw secret, returned exactly once.
#[derive(Debug)]
pub struct ApiKeyOutput {
    pub key: ApiKeyRecord,
    pub raw_secret: String,
}

pub struct ApiKeyService<K, T, L>
where
    K: ApiKeyRepository,
    T: TenantRepository,
    L: AuditLogRepository,
{
    api_key_repo: K,
    guard: TenantIsolationGuard<T>,
    sink: AuditSink<L>,
}

impl<K, T, L> ApiKeyService<K, T, L>
where
    K: ApiKeyRepository,
    T: TenantRepository,
    L: AuditLogRepository,
{
    pub fn new(api_key_repo: K, tenant_repo: T, audit_repo: L) -> Self {
        Self {
            api_key_repo,
            guard: TenantIsolationGuard::new(tenant_repo),
            sink: AuditSink::new(audit_repo),
        }
    }

    pub async fn create_service_account(
        &self,
        principal: &Principal,
        name: &str,
        description: &str,
    ) -> VigilResult<ServiceAccount> {
        principal.require_session()?;
        let ctx = self.guard.resolve(principal).await?;
        assert_authorized(Action::ApiKeysManage, &ctx.subject, None)?;

        if name.trim().is_empty() {
            return Err(VigilError::validation("service account name must not be empty"));
        }

        let account = self
            .api_key_repo
            .create_service_account(CreateServiceAccount {
                tenant_id: ctx.tenant_id,
                owner_user_id: principal.user_id,
                name: name.trim().to_owned(),
                description: description.to_owned(),
            })
            .await?;

        self.sink
            .record_safely(tenant_event(
                ctx.tenant_id,
                principal.user_id,
                "service_account.create",
                AuditTarget {
                    target_type: "service_account",
                    target_id: account.id,
                },
                json!({}),
            ))
            .await;

        Ok(account)
    }

    pub async fn list_service_accounts(
        &self,
        principal: &Principal,
    ) -> VigilResult<Vec<ServiceAccount>> {
        principal.require_session()?;
        let ctx = self.guard.resolve(principal).await?;
        assert_authorized(Action::ApiKeysRead, &ctx.subject, None)?;
        self.api_key_repo.list_service_accounts(ctx.tenant_id).await
    }

    /// Mint a key for a service account. The raw secret appears only in
    /// the returned [`ApiKeyOutput`]; storage keeps its hash and a
    /// 16-character display prefix.
    pub async fn create_api_key(
        &self,
        principal: &Principal,
        service_account_id: Uuid,
        name: &str,
        scopes: BTreeSet<KeyScope>,
    ) -> VigilResult<ApiKeyOutput> {
        principal.require_session()?;
        let ctx = self.guard.resolve(principal).await?;

        // Existence within the tenant first, then permission.
        found(
            self.api_key_repo
                .find_service_account_by_id(ctx.tenant_id, service_account_id)
                .await?,
            "service account",
        )?;
        assert_authorized(Action::ApiKeysManage, &ctx.subject, None)?;

        if scopes.is_empty() {
            return Err(VigilError::validation(
                "API key must carry at least one scope",
            ));
        }

        let raw_secret = vigil_auth::token::generate_api_key();
        let key = self
            .api_key_repo
            .create_api_key(CreateApiKey {
                tenant_id: ctx.tenant_id,
                service_account_id,
                name: name.to_owned(),
                secret_hash: vigil_auth::token::hash_token(&raw_secret),
                secret_prefix: vigil_auth::token::api_key_display_prefix(&raw_secret),
                scopes,
            })
            .await?;

        self.sink
            .record_safely(tenant_event(
                ctx.tenant_id,
                principal.user_id,
                "api_key.create",
                AuditTarget {
                    target_type: "api_key",
                    target_id: key.id,
                },
                json!({ "prefix": key.secret_prefix }),
            ))
            .await;

        Ok(ApiKeyOutput { key, raw_secret })
    }

    pub async fn list_api_keys(&self, principal: &Principal) -> VigilResult<Vec<ApiKeyRecord>> {
        principal.require_session()?;
        let ctx = self.guard.resolve(principal).await?;
        assert_authorized(Action::ApiKeysRead, &ctx.subject, None)?;
        self.api_key_repo.list_api_keys(ctx.tenant_id).await
    }

    /// Revoke a key. Revocation is a tombstone; the key then fails
    /// authentication identically to a key that never existed.
    pub async fn revoke_api_key(
        &self,
        principal: &Principal,
        api_key_id: Uuid,
    ) -> VigilResult<ApiKeyRecord> {
        principal.require_session()?;
        let ctx = self.guard.resolve(principal).await?;

        // Existence within the tenant first, then permission.
        found(
            self.api_key_repo
                .find_api_key_by_id(ctx.tenant_id, api_key_id)
                .await?,
            "api key",
        )?;
        assert_authorized(Action::ApiKeysManage, &ctx.subject, None)?;

        let key = found(
            self.api_key_repo
                .revoke_api_key(ctx.tenant_id, api_key_id)
                .await?,
            "api key",
        )?;

        self.sink
            .record_safely(tenant_event(
                ctx.tenant_id,
                principal.user_id,
                "api_key.revoke",
                AuditTarget {
                    target_type: "api_key",
                    target_id: key.id,
                },
                json!({ "prefix": key.secret_prefix }),
            ))
            .await;

        Ok(key)
    }
}
