//! In-memory implementation of [`ApiKeyRepository`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;
use vigil_core::error::{VigilError, VigilResult};
use vigil_core::models::service_account::{
    ApiKeyRecord, CreateApiKey, CreateServiceAccount, ServiceAccount,
};
use vigil_core::repository::ApiKeyRepository;

#[derive(Default)]
struct ApiKeyState {
    accounts: HashMap<Uuid, ServiceAccount>,
    keys: HashMap<Uuid, ApiKeyRecord>,
}

#[derive(Clone, Default)]
pub struct MemApiKeyRepository {
    state: Arc<RwLock<ApiKeyState>>,
}

impl MemApiKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ApiKeyRepository for MemApiKeyRepository {
    async fn create_service_account(
        &self,
        input: CreateServiceAccount,
    ) -> VigilResult<ServiceAccount> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let account = ServiceAccount {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            owner_user_id: input.owner_user_id,
            name: input.name,
            description: input.description,
            created_at: now,
            updated_at: now,
        };
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn list_service_accounts(&self, tenant_id: Uuid) -> VigilResult<Vec<ServiceAccount>> {
        let state = self.state.read().await;
        let mut rows: Vec<ServiceAccount> = state
            .accounts
            .values()
            .filter(|a| a.tenant_id == tenant_id)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.created_at);
        Ok(rows)
    }

    async fn find_service_account_by_id(
        &self,
        tenant_id: Uuid,
        service_account_id: Uuid,
    ) -> VigilResult<Option<ServiceAccount>> {
        Ok(self
            .state
            .read()
            .await
            .accounts
            .get(&service_account_id)
            .filter(|a| a.tenant_id == tenant_id)
            .cloned())
    }

    async fn create_api_key(&self, input: CreateApiKey) -> VigilResult<ApiKeyRecord> {
        let mut state = self.state.write().await;
        if !state
            .accounts
            .get(&input.service_account_id)
            .is_some_and(|a| a.tenant_id == input.tenant_id)
        {
            return Err(VigilError::not_found("service account"));
        }
        let key = ApiKeyRecord {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            service_account_id: input.service_account_id,
            name: input.name,
            secret_hash: input.secret_hash,
            secret_prefix: input.secret_prefix,
            scopes: input.scopes,
            last_used_at: None,
            revoked_at: None,
            created_at: Utc::now(),
        };
        state.keys.insert(key.id, key.clone());
        Ok(key)
    }

    async fn list_api_keys(&self, tenant_id: Uuid) -> VigilResult<Vec<ApiKeyRecord>> {
        let state = self.state.read().await;
        let mut rows: Vec<ApiKeyRecord> = state
            .keys
            .values()
            .filter(|k| k.tenant_id == tenant_id)
            .cloned()
            .collect();
        rows.sort_by_key(|k| k.created_at);
        Ok(rows)
    }

    async fn find_api_key_by_id(
        &self,
        tenant_id: Uuid,
        api_key_id: Uuid,
    ) -> VigilResult<Option<ApiKeyRecord>> {
        Ok(self
            .state
            .read()
            .await
            .keys
            .get(&api_key_id)
            .filter(|k| k.tenant_id == tenant_id)
            .cloned())
    }

    async fn revoke_api_key(
        &self,
        tenant_id: Uuid,
        api_key_id: Uuid,
    ) -> VigilResult<Option<ApiKeyRecord>> {
        let mut state = self.state.write().await;
        let Some(key) = state
            .keys
            .get_mut(&api_key_id)
            .filter(|k| k.tenant_id == tenant_id)
        else {
            return Ok(None);
        };
        if key.revoked_at.is_none() {
            key.revoked_at = Some(Utc::now());
        }
        Ok(Some(key.clone()))
    }

    async fn find_active_api_key_by_hash(
        &self,
        secret_hash: &str,
    ) -> VigilResult<Option<ApiKeyRecord>> {
        // Revoked rows are skipped, so revoked and unknown keys are
        // indistinguishable to the caller.
        Ok(self
            .state
            .read()
            .await
            .keys
            .values()
            .find(|k| k.secret_hash == secret_hash && k.revoked_at.is_none())
            .cloned())
    }

    async fn mark_api_key_used(&self, api_key_id: Uuid, at: DateTime<Utc>) -> VigilResult<()> {
        let mut state = self.state.write().await;
        let key = state
            .keys
            .get_mut(&api_key_id)
            .ok_or_else(|| VigilError::not_found("api key"))?;
        key.last_used_at = Some(at);
        Ok(())
    }
}
