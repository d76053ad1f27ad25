//! Error taxonomy for the Vigil system.
//!
//! Every externally visible failure maps to one variant here, each with a
//! stable machine-readable code. `NotFound` intentionally conflates "the
//! resource does not exist", "the resource belongs to another tenant", and
//! "the resource exists but you may not learn that" — callers must not be
//! able to distinguish the three.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VigilError {
    #[error("authentication required")]
    AuthenticationRequired,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is locked until {retry_at}")]
    AccountLocked { retry_at: DateTime<Utc> },

    #[error("permission denied: {reason}")]
    PermissionDenied { reason: String },

    #[error("not found: {entity}")]
    NotFound { entity: String },

    #[error("tenant context required")]
    TenantContextRequired,

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("invalid status transition: {from} -> {to}")]
    StatusTransitionInvalid { from: String, to: String },

    #[error("write quota exceeded: {used} of {limit} used")]
    QuotaExceeded { limit: i64, used: i64 },

    #[error("invalid API key")]
    ApiKeyInvalid,

    #[error("API key lacks required scope: {required}")]
    ApiKeyScopeDenied { required: String },

    #[error("invalid pagination cursor")]
    PaginationCursorInvalid,

    #[error("internal error: {0}")]
    Internal(String),
}

impl VigilError {
    /// Construct a `NotFound` for the given entity kind.
    ///
    /// The message names only the entity kind, never the id the caller
    /// supplied, so that "absent" and "foreign tenant" responses are
    /// byte-identical.
    pub fn not_found(entity: impl Into<String>) -> Self {
        VigilError::NotFound {
            entity: entity.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        VigilError::Validation {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for API serialization.
    pub fn code(&self) -> &'static str {
        match self {
            VigilError::AuthenticationRequired => "auth_required",
            VigilError::InvalidCredentials => "invalid_credentials",
            VigilError::AccountLocked { .. } => "account_locked",
            VigilError::PermissionDenied { .. } => "permission_denied",
            VigilError::NotFound { .. } => "not_found",
            VigilError::TenantContextRequired => "tenant_context_required",
            VigilError::Validation { .. } => "validation_error",
            VigilError::StatusTransitionInvalid { .. } => "status_transition_invalid",
            VigilError::QuotaExceeded { .. } => "quota_exceeded",
            VigilError::ApiKeyInvalid => "api_key_invalid",
            VigilError::ApiKeyScopeDenied { .. } => "api_key_scope_denied",
            VigilError::PaginationCursorInvalid => "pagination_cursor_invalid",
            VigilError::Internal(_) => "internal",
        }
    }
}

pub type VigilResult<T> = Result<T, VigilError>;
