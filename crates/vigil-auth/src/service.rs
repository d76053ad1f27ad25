//! Authentication service — signup, login/logout, and password-reset
//! orchestration.

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;
use vigil_core::error::{VigilError, VigilResult};
use vigil_core::models::session::{CreateSession, Session};
use vigil_core::models::user::{CreateUser, User};
use vigil_core::models::audit::CreateAuditLogEvent;
use vigil_core::principal::Principal;
use vigil_core::repository::{AuditLogRepository, AuthRepository};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Raw opaque session token (set as the cookie value, not stored).
    pub session_token: String,
    pub session: Session,
    pub user: User,
}

/// Only the domain of an email ever reaches audit metadata.
fn email_domain(email: &str) -> &str {
    email.rsplit_once('@').map(|(_, d)| d).unwrap_or("")
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer has
/// no dependency on the store crate.
pub struct AuthService<A: AuthRepository, L: AuditLogRepository> {
    auth_repo: A,
    audit_repo: L,
    config: AuthConfig,
}

impl<A: AuthRepository, L: AuditLogRepository> AuthService<A, L> {
    pub fn new(auth_repo: A, audit_repo: L, config: AuthConfig) -> Self {
        Self {
            auth_repo,
            audit_repo,
            config,
        }
    }

    /// Fire-and-forget audit write. Audit unavailability never fails
    /// the primary operation.
    async fn audit(&self, event: CreateAuditLogEvent) {
        let action = event.action.clone();
        if let Err(e) = self.audit_repo.create_event(event).await {
            tracing::warn!(action = %action, error = %e, "audit write failed");
        }
    }

    /// Register a new user account.
    pub async fn signup(
        &self,
        email: &str,
        display_name: &str,
        password: &str,
    ) -> VigilResult<User> {
        password::check_password_policy(password, self.config.min_password_length)?;
        let email = email.trim().to_ascii_lowercase();
        if email.split_once('@').is_none_or(|(l, d)| l.is_empty() || d.is_empty()) {
            return Err(VigilError::validation("invalid email address"));
        }
        if self.auth_repo.find_user_by_email(&email).await?.is_some() {
            return Err(VigilError::validation("email already registered"));
        }

        let password_hash = password::hash_password(password, self.config.pepper.as_deref())?;
        let user = self
            .auth_repo
            .create_user(CreateUser {
                email: email.clone(),
                display_name: display_name.trim().to_owned(),
                password_hash,
            })
            .await?;

        self.audit(CreateAuditLogEvent {
            tenant_id: None,
            actor_user_id: Some(user.id),
            action: "auth.signup".into(),
            target_type: Some("user".into()),
            target_id: Some(user.id),
            metadata: json!({ "email_domain": email_domain(&email) }),
            trace_id: None,
        })
        .await;

        Ok(user)
    }

    /// Authenticate with email + password and open a session.
    ///
    /// Failed attempts are counted; crossing the threshold locks the
    /// account for the configured duration, and `AccountLocked` carries
    /// the retry time. A success clears the failure state.
    pub async fn login(&self, email: &str, password_input: &str) -> VigilResult<LoginOutput> {
        let email = email.trim().to_ascii_lowercase();
        let user = self
            .auth_repo
            .find_user_by_email(&email)
            .await?
            .ok_or(VigilError::InvalidCredentials)?;

        let now = Utc::now();
        if let Some(until) = user.locked_until {
            if until > now {
                return Err(AuthError::AccountLocked { retry_at: until }.into());
            }
        }

        let valid = password::verify_password(
            password_input,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;

        if !valid {
            let attempts = user.failed_login_attempts + 1;
            let lock_until = (attempts >= self.config.max_failed_login_attempts)
                .then(|| now + Duration::seconds(self.config.lockout_duration_secs as i64));
            self.auth_repo
                .record_failed_login(user.id, lock_until)
                .await?;
            return Err(VigilError::InvalidCredentials);
        }

        self.auth_repo.clear_failed_login_state(user.id).await?;

        let raw_token = token::generate_token();
        let session = self
            .auth_repo
            .create_session(CreateSession {
                user_id: user.id,
                token_hash: token::hash_token(&raw_token),
                active_tenant_id: None,
                expires_at: now + Duration::seconds(self.config.session_lifetime_secs as i64),
            })
            .await?;

        self.audit(CreateAuditLogEvent {
            tenant_id: None,
            actor_user_id: Some(user.id),
            action: "auth.login".into(),
            target_type: Some("session".into()),
            target_id: Some(session.id),
            metadata: json!({ "email_domain": email_domain(&email) }),
            trace_id: None,
        })
        .await;

        Ok(LoginOutput {
            session_token: raw_token,
            session,
            user,
        })
    }

    /// Invalidate the principal's session.
    pub async fn logout(&self, principal: &Principal) -> VigilResult<()> {
        let session_id = principal
            .session_id
            .ok_or(VigilError::AuthenticationRequired)?;
        self.auth_repo.delete_session(session_id).await?;

        self.audit(CreateAuditLogEvent {
            tenant_id: None,
            actor_user_id: Some(principal.user_id),
            action: "auth.logout".into(),
            target_type: Some("session".into()),
            target_id: Some(session_id),
            metadata: json!({}),
            trace_id: None,
        })
        .await;

        Ok(())
    }

    /// Issue a one-time password-reset token.
    ///
    /// Returns the raw token for delivery, or `None` when the email is
    /// unknown — the caller responds identically either way, so the
    /// endpoint cannot be used to enumerate accounts.
    pub async fn request_password_reset(&self, email: &str) -> VigilResult<Option<String>> {
        let email = email.trim().to_ascii_lowercase();
        let Some(user) = self.auth_repo.find_user_by_email(&email).await? else {
            return Ok(None);
        };

        let raw = token::generate_token();
        let expires_at =
            Utc::now() + Duration::seconds(self.config.reset_token_lifetime_secs as i64);
        self.auth_repo
            .create_password_reset_token(user.id, token::hash_token(&raw), expires_at)
            .await?;

        self.audit(CreateAuditLogEvent {
            tenant_id: None,
            actor_user_id: Some(user.id),
            action: "auth.password_reset_requested".into(),
            target_type: Some("user".into()),
            target_id: Some(user.id),
            metadata: json!({ "email_domain": email_domain(&email) }),
            trace_id: None,
        })
        .await;

        Ok(Some(raw))
    }

    /// Consume a reset token and set a new password. The token is
    /// single-use and all other outstanding tokens for the user are
    /// purged.
    pub async fn complete_password_reset(
        &self,
        raw_token: &str,
        new_password: &str,
    ) -> VigilResult<Uuid> {
        password::check_password_policy(new_password, self.config.min_password_length)?;

        let consumed = self
            .auth_repo
            .consume_password_reset_token(&token::hash_token(raw_token))
            .await?
            .ok_or(AuthError::ResetTokenInvalid)?;

        let password_hash = password::hash_password(new_password, self.config.pepper.as_deref())?;
        self.auth_repo
            .update_user_password(consumed.user_id, password_hash)
            .await?;
        self.auth_repo
            .purge_password_reset_tokens(consumed.user_id)
            .await?;
        // A successful reset also unwinds any lockout.
        self.auth_repo
            .clear_failed_login_state(consumed.user_id)
            .await?;

        self.audit(CreateAuditLogEvent {
            tenant_id: None,
            actor_user_id: Some(consumed.user_id),
            action: "auth.password_reset_completed".into(),
            target_type: Some("user".into()),
            target_id: Some(consumed.user_id),
            metadata: json!({}),
            trace_id: None,
        })
        .await;

        Ok(consumed.user_id)
    }
}
