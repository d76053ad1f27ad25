//! Invite lifecycle integration tests.

use chrono::{Duration, Utc};
use uuid::Uuid;
use vigil_core::models::role::OrgRole;
use vigil_core::models::user::CreateUser;
use vigil_core::principal::Principal;
use vigil_core::repository::AuthRepository;
use vigil_service::{ServiceConfig, TenantService};
use vigil_store::{MemAuditLogRepository, MemAuthRepository, MemTenantRepository};

struct World {
    auth: MemAuthRepository,
    svc: TenantService<MemTenantRepository, MemAuthRepository, MemAuditLogRepository>,
}

fn world() -> World {
    let auth = MemAuthRepository::new();
    World {
        svc: TenantService::new(
            MemTenantRepository::new(),
            auth.clone(),
            MemAuditLogRepository::new(),
            ServiceConfig::default(),
        ),
        auth,
    }
}

impl World {
    async fn user(&self, email: &str) -> Principal {
        let user = self
            .auth
            .create_user(CreateUser {
                email: email.into(),
                display_name: "Test".into(),
                password_hash: "$argon2id$fake".into(),
            })
            .await
            .unwrap();
        Principal::session(user.id, Uuid::new_v4(), None)
    }

    async fn owner_of(&self, slug: &str, email: &str) -> Principal {
        let p = self.user(email).await;
        let (tenant, _) = self.svc.create_tenant(&p, slug, slug).await.unwrap();
        Principal::session(p.user_id, Uuid::new_v4(), Some(tenant.id))
    }
}

#[tokio::test]
async fn invite_accept_grants_the_assigned_role() {
    let w = world();
    let owner = w.owner_of("acme", "owner@example.com").await;
    let invitee = w.user("responder@example.com").await;

    let out = w
        .svc
        .invite_member(&owner, "responder@example.com", OrgRole::Responder)
        .await
        .unwrap();
    let membership = w.svc.accept_invite(&invitee, &out.raw_token).await.unwrap();
    assert_eq!(membership.role, OrgRole::Responder);
    assert_eq!(membership.tenant_id, owner.tenant_id.unwrap());
}

#[tokio::test]
async fn invite_cannot_be_accepted_twice() {
    let w = world();
    let owner = w.owner_of("acme", "owner@example.com").await;
    let invitee = w.user("new@example.com").await;

    let out = w
        .svc
        .invite_member(&owner, "new@example.com", OrgRole::Viewer)
        .await
        .unwrap();
    w.svc.accept_invite(&invitee, &out.raw_token).await.unwrap();
    let err = w.svc.accept_invite(&invitee, &out.raw_token).await.unwrap_err();
    assert_eq!(err.code(), "validation_error");
}

#[tokio::test]
async fn expired_invite_is_rejected() {
    let w = world();
    let owner = w.owner_of("acme", "owner@example.com").await;
    let invitee = w.user("late@example.com").await;

    // Zero-lifetime invites expire immediately.
    let short = TenantService::new(
        MemTenantRepository::new(),
        w.auth.clone(),
        MemAuditLogRepository::new(),
        ServiceConfig {
            invite_lifetime_secs: 0,
            ..ServiceConfig::default()
        },
    );
    let (tenant, _) = short
        .create_tenant(&owner, "other", "other")
        .await
        .unwrap();
    let owner_other = Principal::session(owner.user_id, Uuid::new_v4(), Some(tenant.id));
    let out = short
        .invite_member(&owner_other, "late@example.com", OrgRole::Viewer)
        .await
        .unwrap();
    assert!(out.invite.expires_at <= Utc::now() + Duration::seconds(1));

    let err = short.accept_invite(&invitee, &out.raw_token).await.unwrap_err();
    assert_eq!(err.code(), "validation_error");
}

#[tokio::test]
async fn mismatched_email_cannot_accept() {
    let w = world();
    let owner = w.owner_of("acme", "owner@example.com").await;
    let wrong_user = w.user("other@example.com").await;

    let out = w
        .svc
        .invite_member(&owner, "intended@example.com", OrgRole::Viewer)
        .await
        .unwrap();
    let err = w.svc.accept_invite(&wrong_user, &out.raw_token).await.unwrap_err();
    assert_eq!(err.code(), "validation_error");
}

#[tokio::test]
async fn email_match_is_case_insensitive() {
    let w = world();
    let owner = w.owner_of("acme", "owner@example.com").await;
    let invitee = w.user("Mixed.Case@Example.COM").await;

    let out = w
        .svc
        .invite_member(&owner, "mixed.case@example.com", OrgRole::Viewer)
        .await
        .unwrap();
    assert!(w.svc.accept_invite(&invitee, &out.raw_token).await.is_ok());
}

#[tokio::test]
async fn garbage_token_reads_like_any_other_invalid_invite() {
    let w = world();
    let someone = w.user("someone@example.com").await;
    let err = w.svc.accept_invite(&someone, "not-a-real-token").await.unwrap_err();
    assert_eq!(err.code(), "validation_error");
}

#[tokio::test]
async fn only_managers_may_invite() {
    let w = world();
    let owner = w.owner_of("acme", "owner@example.com").await;
    let invitee = w.user("viewer@example.com").await;

    let out = w
        .svc
        .invite_member(&owner, "viewer@example.com", OrgRole::Viewer)
        .await
        .unwrap();
    let membership = w.svc.accept_invite(&invitee, &out.raw_token).await.unwrap();

    let viewer = Principal::session(
        invitee.user_id,
        Uuid::new_v4(),
        Some(membership.tenant_id),
    );
    let err = w
        .svc
        .invite_member(&viewer, "friend@example.com", OrgRole::Viewer)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "permission_denied");
}

#[tokio::test]
async fn raw_invite_token_is_never_stored() {
    let w = world();
    let owner = w.owner_of("acme", "owner@example.com").await;
    let out = w
        .svc
        .invite_member(&owner, "x@example.com", OrgRole::Viewer)
        .await
        .unwrap();
    assert_ne!(out.invite.token_hash, out.raw_token);
    assert!(!out.invite.token_hash.contains(&out.raw_token));
}
