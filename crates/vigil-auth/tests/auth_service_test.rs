//! Integration tests for the authentication service and principal
//! resolver against the in-memory store.

use std::collections::BTreeSet;

use chrono::Utc;
use vigil_auth::config::AuthConfig;
use vigil_auth::resolver::PrincipalResolver;
use vigil_auth::service::AuthService;
use vigil_auth::token;
use vigil_core::error::VigilError;
use vigil_core::models::service_account::{CreateApiKey, CreateServiceAccount, KeyScope};
use vigil_core::principal::AuthKind;
use vigil_core::repository::ApiKeyRepository;
use vigil_store::{MemApiKeyRepository, MemAuditLogRepository, MemAuthRepository};

use uuid::Uuid;

fn test_config() -> AuthConfig {
    AuthConfig {
        min_password_length: 8,
        max_failed_login_attempts: 3,
        lockout_duration_secs: 300,
        ..AuthConfig::default()
    }
}

fn service() -> (
    AuthService<MemAuthRepository, MemAuditLogRepository>,
    MemAuthRepository,
    MemAuditLogRepository,
) {
    let auth_repo = MemAuthRepository::new();
    let audit_repo = MemAuditLogRepository::new();
    (
        AuthService::new(auth_repo.clone(), audit_repo.clone(), test_config()),
        auth_repo,
        audit_repo,
    )
}

#[tokio::test]
async fn signup_then_login_opens_a_session() {
    let (auth, auth_repo, _) = service();
    let user = auth
        .signup("alice@example.com", "Alice", "correct horse battery")
        .await
        .unwrap();

    let out = auth.login("alice@example.com", "correct horse battery").await.unwrap();
    assert_eq!(out.user.id, user.id);

    // The raw session token resolves back to a session principal.
    let resolver = PrincipalResolver::new(auth_repo, MemApiKeyRepository::new());
    let principal = resolver.resolve_session(&out.session_token).await.unwrap();
    assert_eq!(principal.auth, AuthKind::Session);
    assert_eq!(principal.user_id, user.id);
    assert_eq!(principal.tenant_id, None);
}

#[tokio::test]
async fn login_email_is_case_insensitive() {
    let (auth, _, _) = service();
    auth.signup("Bob@Example.com", "Bob", "hunter2hunter2").await.unwrap();
    assert!(auth.login("bob@example.com", "hunter2hunter2").await.is_ok());
}

#[tokio::test]
async fn wrong_password_is_invalid_credentials() {
    let (auth, _, _) = service();
    auth.signup("carol@example.com", "Carol", "hunter2hunter2")
        .await
        .unwrap();
    let err = auth.login("carol@example.com", "nope-nope").await.unwrap_err();
    assert_eq!(err.code(), "invalid_credentials");
}

#[tokio::test]
async fn unknown_email_fails_like_wrong_password() {
    let (auth, _, _) = service();
    let err = auth.login("ghost@example.com", "whatever-pw").await.unwrap_err();
    assert_eq!(err.code(), "invalid_credentials");
}

#[tokio::test]
async fn repeated_failures_lock_the_account() {
    let (auth, _, _) = service();
    auth.signup("dave@example.com", "Dave", "hunter2hunter2").await.unwrap();

    for _ in 0..3 {
        let _ = auth.login("dave@example.com", "wrong-password").await;
    }
    let err = auth.login("dave@example.com", "hunter2hunter2").await.unwrap_err();
    match err {
        VigilError::AccountLocked { retry_at } => assert!(retry_at > Utc::now()),
        other => panic!("expected AccountLocked, got {other:?}"),
    }
}

#[tokio::test]
async fn successful_login_clears_failure_count() {
    let (auth, _, _) = service();
    auth.signup("erin@example.com", "Erin", "hunter2hunter2").await.unwrap();

    let _ = auth.login("erin@example.com", "wrong-password").await;
    let _ = auth.login("erin@example.com", "wrong-password").await;
    auth.login("erin@example.com", "hunter2hunter2").await.unwrap();

    // Two more failures must not lock (counter restarted).
    let _ = auth.login("erin@example.com", "wrong-password").await;
    let _ = auth.login("erin@example.com", "wrong-password").await;
    let err = auth.login("erin@example.com", "wrong-password").await.unwrap_err();
    assert_eq!(err.code(), "invalid_credentials");
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let (auth, auth_repo, _) = service();
    auth.signup("frank@example.com", "Frank", "hunter2hunter2")
        .await
        .unwrap();
    let out = auth.login("frank@example.com", "hunter2hunter2").await.unwrap();

    let resolver = PrincipalResolver::new(auth_repo, MemApiKeyRepository::new());
    let principal = resolver.resolve_session(&out.session_token).await.unwrap();
    auth.logout(&principal).await.unwrap();

    let err = resolver.resolve_session(&out.session_token).await.unwrap_err();
    assert_eq!(err.code(), "auth_required");
}

#[tokio::test]
async fn password_reset_is_single_use() {
    let (auth, _, _) = service();
    auth.signup("grace@example.com", "Grace", "old-password!")
        .await
        .unwrap();

    let raw = auth
        .request_password_reset("grace@example.com")
        .await
        .unwrap()
        .expect("token for known email");

    auth.complete_password_reset(&raw, "new-password!").await.unwrap();
    assert!(auth.login("grace@example.com", "new-password!").await.is_ok());
    assert!(auth.login("grace@example.com", "old-password!").await.is_err());

    // Second use of the same token fails.
    let err = auth
        .complete_password_reset(&raw, "another-password!")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "invalid_credentials");
}

#[tokio::test]
async fn reset_request_for_unknown_email_is_silent() {
    let (auth, _, _) = service();
    let out = auth.request_password_reset("nobody@example.com").await.unwrap();
    assert!(out.is_none());
}

#[tokio::test]
async fn audit_metadata_never_contains_the_email_local_part() {
    let (auth, _, audit_repo) = service();
    auth.signup("secret-name@example.com", "S", "hunter2hunter2")
        .await
        .unwrap();
    for event in audit_repo.all_events().await {
        let raw = event.metadata.to_string();
        assert!(!raw.contains("secret-name"), "leaked local part in {raw}");
    }
}

// -- API-key lane -----------------------------------------------------------

async fn seeded_key(
    scopes: BTreeSet<KeyScope>,
) -> (MemApiKeyRepository, String, Uuid) {
    let repo = MemApiKeyRepository::new();
    let tenant_id = Uuid::new_v4();
    let account = repo
        .create_service_account(CreateServiceAccount {
            tenant_id,
            owner_user_id: Uuid::new_v4(),
            name: "deploy-bot".into(),
            description: String::new(),
        })
        .await
        .unwrap();
    let raw = token::generate_api_key();
    repo.create_api_key(CreateApiKey {
        tenant_id,
        service_account_id: account.id,
        name: "ci".into(),
        secret_hash: token::hash_token(&raw),
        secret_prefix: token::api_key_display_prefix(&raw),
        scopes,
    })
    .await
    .unwrap();
    (repo, raw, tenant_id)
}

#[tokio::test]
async fn api_key_resolves_to_a_tenant_bound_principal() {
    let (keys, raw, tenant_id) = seeded_key([KeyScope::Read, KeyScope::Write].into()).await;
    let resolver = PrincipalResolver::new(MemAuthRepository::new(), keys);

    let principal = resolver.resolve_api_key(&raw, "POST").await.unwrap();
    assert_eq!(principal.auth, AuthKind::ApiKey);
    assert_eq!(principal.tenant_id, Some(tenant_id));
    assert!(principal.api_key_id.is_some());
}

#[tokio::test]
async fn api_key_header_takes_precedence_over_session() {
    let (keys, raw, tenant_id) = seeded_key([KeyScope::Read].into()).await;
    let resolver = PrincipalResolver::new(MemAuthRepository::new(), keys);

    let principal = resolver
        .resolve(Some(&raw), Some("some-session-token"), "GET")
        .await
        .unwrap();
    assert_eq!(principal.auth, AuthKind::ApiKey);
    assert_eq!(principal.tenant_id, Some(tenant_id));
}

#[tokio::test]
async fn read_only_key_is_scope_denied_for_mutations() {
    let (keys, raw, _) = seeded_key([KeyScope::Read].into()).await;
    let resolver = PrincipalResolver::new(MemAuthRepository::new(), keys);

    assert!(resolver.resolve_api_key(&raw, "GET").await.is_ok());
    let err = resolver.resolve_api_key(&raw, "POST").await.unwrap_err();
    // Scope denial implies a known credential — distinct from
    // authentication failure.
    assert_eq!(err.code(), "api_key_scope_denied");
}

#[tokio::test]
async fn malformed_prefix_short_circuits() {
    let resolver = PrincipalResolver::new(MemAuthRepository::new(), MemApiKeyRepository::new());
    let err = resolver.resolve_api_key("sk_wrongprefix", "GET").await.unwrap_err();
    assert_eq!(err.code(), "api_key_invalid");
}

#[tokio::test]
async fn unknown_and_revoked_keys_fail_identically() {
    let (keys, raw, tenant_id) = seeded_key([KeyScope::Read].into()).await;
    let resolver = PrincipalResolver::new(MemAuthRepository::new(), keys.clone());

    let unknown = resolver
        .resolve_api_key(&token::generate_api_key(), "GET")
        .await
        .unwrap_err();

    let listed = keys.list_api_keys(tenant_id).await.unwrap();
    keys.revoke_api_key(tenant_id, listed[0].id).await.unwrap();
    let revoked = resolver.resolve_api_key(&raw, "GET").await.unwrap_err();

    assert_eq!(unknown.code(), "api_key_invalid");
    assert_eq!(revoked.code(), "api_key_invalid");
    assert_eq!(unknown.to_string(), revoked.to_string());
}

#[tokio::test]
async fn successful_key_use_updates_last_used() {
    let (keys, raw, tenant_id) = seeded_key([KeyScope::Read].into()).await;
    let resolver = PrincipalResolver::new(MemAuthRepository::new(), keys.clone());

    resolver.resolve_api_key(&raw, "GET").await.unwrap();
    let listed = keys.list_api_keys(tenant_id).await.unwrap();
    assert!(listed[0].last_used_at.is_some());
}

#[tokio::test]
async fn no_credentials_is_authentication_required() {
    let resolver = PrincipalResolver::new(MemAuthRepository::new(), MemApiKeyRepository::new());
    let err = resolver.resolve(None, None, "GET").await.unwrap_err();
    assert_eq!(err.code(), "auth_required");
}
