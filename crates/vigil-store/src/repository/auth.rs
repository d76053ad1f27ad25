//! In-memory implementation of [`AuthRepository`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;
use vigil_core::error::{VigilError, VigilResult};
use vigil_core::models::session::{CreateSession, Session};
use vigil_core::models::user::{CreateUser, PasswordResetToken, User};
use vigil_core::repository::AuthRepository;

#[derive(Default)]
struct AuthState {
    users: HashMap<Uuid, User>,
    sessions: HashMap<Uuid, Session>,
    reset_tokens: HashMap<Uuid, PasswordResetToken>,
}

/// In-memory user/session/reset-token store.
#[derive(Clone, Default)]
pub struct MemAuthRepository {
    state: Arc<RwLock<AuthState>>,
}

impl MemAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuthRepository for MemAuthRepository {
    async fn create_user(&self, input: CreateUser) -> VigilResult<User> {
        let mut state = self.state.write().await;
        if state
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&input.email))
        {
            return Err(VigilError::validation("email already registered"));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: input.email,
            display_name: input.display_name,
            password_hash: input.password_hash,
            failed_login_attempts: 0,
            locked_until: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> VigilResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> VigilResult<Option<User>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update_user_password(&self, user_id: Uuid, password_hash: String) -> VigilResult<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| VigilError::not_found("user"))?;
        user.password_hash = password_hash;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn record_failed_login(
        &self,
        user_id: Uuid,
        lock_until: Option<DateTime<Utc>>,
    ) -> VigilResult<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| VigilError::not_found("user"))?;
        user.failed_login_attempts += 1;
        if lock_until.is_some() {
            user.locked_until = lock_until;
        }
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn clear_failed_login_state(&self, user_id: Uuid) -> VigilResult<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| VigilError::not_found("user"))?;
        user.failed_login_attempts = 0;
        user.locked_until = None;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn create_session(&self, input: CreateSession) -> VigilResult<Session> {
        let mut state = self.state.write().await;
        let session = Session {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            token_hash: input.token_hash,
            active_tenant_id: input.active_tenant_id,
            expires_at: input.expires_at,
            created_at: Utc::now(),
        };
        state.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session_by_token_hash(&self, token_hash: &str) -> VigilResult<Option<Session>> {
        Ok(self
            .state
            .read()
            .await
            .sessions
            .values()
            .find(|s| s.token_hash == token_hash)
            .cloned())
    }

    async fn set_session_active_tenant(
        &self,
        session_id: Uuid,
        tenant_id: Uuid,
    ) -> VigilResult<()> {
        let mut state = self.state.write().await;
        let session = state
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| VigilError::not_found("session"))?;
        session.active_tenant_id = Some(tenant_id);
        Ok(())
    }

    async fn delete_session(&self, session_id: Uuid) -> VigilResult<()> {
        self.state.write().await.sessions.remove(&session_id);
        Ok(())
    }

    async fn create_password_reset_token(
        &self,
        user_id: Uuid,
        token_hash: String,
        expires_at: DateTime<Utc>,
    ) -> VigilResult<PasswordResetToken> {
        let mut state = self.state.write().await;
        let token = PasswordResetToken {
            id: Uuid::new_v4(),
            user_id,
            token_hash,
            expires_at,
            created_at: Utc::now(),
        };
        state.reset_tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn consume_password_reset_token(
        &self,
        token_hash: &str,
    ) -> VigilResult<Option<PasswordResetToken>> {
        let mut state = self.state.write().await;
        let found = state
            .reset_tokens
            .values()
            .find(|t| t.token_hash == token_hash && t.expires_at > Utc::now())
            .map(|t| t.id);
        Ok(found.and_then(|id| state.reset_tokens.remove(&id)))
    }

    async fn purge_password_reset_tokens(&self, user_id: Uuid) -> VigilResult<()> {
        self.state
            .write()
            .await
            .reset_tokens
            .retain(|_, t| t.user_id != user_id);
        Ok(())
    }
}
