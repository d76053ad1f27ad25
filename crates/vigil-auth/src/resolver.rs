//! Principal resolution — the two authentication lanes.
//!
//! Normalizes a session cookie or an API-key header into one
//! [`Principal`] consumed uniformly downstream. The API-key lane takes
//! precedence when both are present.

use chrono::Utc;
use vigil_core::error::{VigilError, VigilResult};
use vigil_core::principal::{MethodClass, Principal};
use vigil_core::repository::{ApiKeyRepository, AuthRepository};

use crate::token::{API_KEY_PREFIX, hash_token};

/// Resolves raw request credentials into a [`Principal`].
///
/// Generic over repository implementations so the auth layer has no
/// dependency on the store crate.
pub struct PrincipalResolver<A: AuthRepository, K: ApiKeyRepository> {
    auth_repo: A,
    api_key_repo: K,
}

impl<A: AuthRepository, K: ApiKeyRepository> PrincipalResolver<A, K> {
    pub fn new(auth_repo: A, api_key_repo: K) -> Self {
        Self {
            auth_repo,
            api_key_repo,
        }
    }

    /// Resolve a request's credentials. An API-key header, when present,
    /// wins over the session cookie; with neither the request is
    /// unauthenticated.
    pub async fn resolve(
        &self,
        api_key_header: Option<&str>,
        session_token: Option<&str>,
        method: &str,
    ) -> VigilResult<Principal> {
        if let Some(raw_key) = api_key_header {
            return self.resolve_api_key(raw_key, method).await;
        }
        match session_token {
            Some(raw) => self.resolve_session(raw).await,
            None => Err(VigilError::AuthenticationRequired),
        }
    }

    /// Session lane: look up the server-side session by token hash and
    /// reject expired sessions.
    pub async fn resolve_session(&self, raw_token: &str) -> VigilResult<Principal> {
        let token_hash = hash_token(raw_token);
        let session = self
            .auth_repo
            .find_session_by_token_hash(&token_hash)
            .await?
            .ok_or(VigilError::AuthenticationRequired)?;

        if session.expires_at <= Utc::now() {
            return Err(VigilError::AuthenticationRequired);
        }

        Ok(Principal::session(
            session.user_id,
            session.id,
            session.active_tenant_id,
        ))
    }

    /// API-key lane.
    ///
    /// A malformed prefix short-circuits without touching storage. A
    /// well-formed but unknown key and a revoked key fail identically —
    /// the active-key lookup skips revoked rows, so neither timing nor
    /// the error distinguishes them. Scope denial is a separate failure
    /// class: it implies a valid, known credential.
    pub async fn resolve_api_key(&self, raw_key: &str, method: &str) -> VigilResult<Principal> {
        if !raw_key.starts_with(API_KEY_PREFIX) {
            return Err(VigilError::ApiKeyInvalid);
        }

        let secret_hash = hash_token(raw_key);
        let key = self
            .api_key_repo
            .find_active_api_key_by_hash(&secret_hash)
            .await?
            .ok_or(VigilError::ApiKeyInvalid)?;

        let required = MethodClass::of(method).required_scope();
        if !key.scopes.contains(&required) {
            return Err(VigilError::ApiKeyScopeDenied {
                required: required.to_string(),
            });
        }

        // The key acts as its service account's owner within the bound
        // tenant.
        let account = self
            .api_key_repo
            .find_service_account_by_id(key.tenant_id, key.service_account_id)
            .await?
            .ok_or(VigilError::ApiKeyInvalid)?;

        // Best-effort last-used bump; never fails the request.
        if let Err(e) = self.api_key_repo.mark_api_key_used(key.id, Utc::now()).await {
            tracing::debug!(api_key_id = %key.id, error = %e, "failed to record API key use");
        }

        Ok(Principal::api_key(
            account.owner_user_id,
            key.tenant_id,
            key.id,
            key.scopes,
        ))
    }
}
