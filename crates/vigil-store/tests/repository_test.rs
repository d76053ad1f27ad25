//! Integration tests for the in-memory repositories: tenant scoping,
//! membership uniqueness, and list ordering.

use vigil_core::cursor::PageRequest;
use vigil_core::models::incident::{CreateIncident, Severity};
use vigil_core::models::role::OrgRole;
use vigil_core::models::tenant::{CreateInvite, CreateTenant};
use vigil_core::models::user::CreateUser;
use vigil_core::repository::{AuthRepository, IncidentRepository, TenantRepository};
use vigil_store::{MemAuthRepository, MemIncidentRepository, MemTenantRepository};

use chrono::{Duration, Utc};
use uuid::Uuid;

async fn new_user(repo: &MemAuthRepository, email: &str) -> Uuid {
    repo.create_user(CreateUser {
        email: email.into(),
        display_name: "Test".into(),
        password_hash: "$argon2id$fake".into(),
    })
    .await
    .unwrap()
    .id
}

fn declare(tenant_id: Uuid, title: &str) -> CreateIncident {
    CreateIncident {
        tenant_id,
        title: title.into(),
        description: String::new(),
        severity: Severity::Sev2,
        start_time: Utc::now(),
        impacted_services: Default::default(),
    }
}

#[tokio::test]
async fn tenant_creation_installs_owner_membership() {
    let auth = MemAuthRepository::new();
    let tenants = MemTenantRepository::new();
    let owner = new_user(&auth, "owner@example.com").await;

    let (tenant, membership) = tenants
        .create_tenant_with_owner(
            CreateTenant {
                name: "Acme".into(),
                slug: "acme".into(),
            },
            owner,
        )
        .await
        .unwrap();

    assert_eq!(membership.role, OrgRole::Owner);
    assert_eq!(membership.tenant_id, tenant.id);
    let found = tenants.get_membership(tenant.id, owner).await.unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn duplicate_slug_is_rejected() {
    let tenants = MemTenantRepository::new();
    let owner = Uuid::new_v4();
    tenants
        .create_tenant_with_owner(
            CreateTenant {
                name: "Acme".into(),
                slug: "acme".into(),
            },
            owner,
        )
        .await
        .unwrap();
    let err = tenants
        .create_tenant_with_owner(
            CreateTenant {
                name: "Other".into(),
                slug: "acme".into(),
            },
            owner,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "validation_error");
}

#[tokio::test]
async fn incident_lookup_is_tenant_scoped() {
    let incidents = MemIncidentRepository::new();
    let tenant_a = Uuid::new_v4();
    let tenant_b = Uuid::new_v4();

    let created = incidents.create_incident(declare(tenant_a, "db down")).await.unwrap();

    // Same id, wrong tenant: indistinguishable from absent.
    let foreign = incidents
        .find_incident_by_id(tenant_b, created.id)
        .await
        .unwrap();
    assert!(foreign.is_none());
    let absent = incidents
        .find_incident_by_id(tenant_a, Uuid::new_v4())
        .await
        .unwrap();
    assert!(absent.is_none());

    let home = incidents
        .find_incident_by_id(tenant_a, created.id)
        .await
        .unwrap();
    assert!(home.is_some());
}

#[tokio::test]
async fn incident_list_never_spans_tenants() {
    let incidents = MemIncidentRepository::new();
    let tenant_a = Uuid::new_v4();
    let tenant_b = Uuid::new_v4();

    for i in 0..3 {
        incidents
            .create_incident(declare(tenant_a, &format!("a-{i}")))
            .await
            .unwrap();
    }
    incidents.create_incident(declare(tenant_b, "b-0")).await.unwrap();

    let page = incidents
        .list_incidents(tenant_a, PageRequest::from_raw(Some(50), None).unwrap())
        .await
        .unwrap();
    assert_eq!(page.items.len(), 3);
    assert!(page.items.iter().all(|i| i.tenant_id == tenant_a));
}

#[tokio::test]
async fn list_orders_newest_first_with_id_tiebreak() {
    let incidents = MemIncidentRepository::new();
    let tenant = Uuid::new_v4();
    for i in 0..5 {
        incidents
            .create_incident(declare(tenant, &format!("inc-{i}")))
            .await
            .unwrap();
    }
    let page = incidents
        .list_incidents(tenant, PageRequest::from_raw(Some(50), None).unwrap())
        .await
        .unwrap();
    let keys: Vec<_> = page.items.iter().map(|i| (i.created_at, i.id)).collect();
    let mut sorted = keys.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(keys, sorted);
}

#[tokio::test]
async fn invite_acceptance_upserts_membership_role() {
    let tenants = MemTenantRepository::new();
    let owner = Uuid::new_v4();
    let invitee = Uuid::new_v4();
    let (tenant, _) = tenants
        .create_tenant_with_owner(
            CreateTenant {
                name: "Acme".into(),
                slug: "acme".into(),
            },
            owner,
        )
        .await
        .unwrap();

    let invite = tenants
        .create_invite(CreateInvite {
            tenant_id: tenant.id,
            email: "new@example.com".into(),
            role: OrgRole::Viewer,
            token_hash: "hash-1".into(),
            expires_at: Utc::now() + Duration::days(7),
        })
        .await
        .unwrap();

    let membership = tenants
        .accept_invite(invite.id, invitee, invite.role)
        .await
        .unwrap();
    assert_eq!(membership.role, OrgRole::Viewer);

    // A second invite for the same user overwrites the role in place.
    let invite2 = tenants
        .create_invite(CreateInvite {
            tenant_id: tenant.id,
            email: "new@example.com".into(),
            role: OrgRole::Responder,
            token_hash: "hash-2".into(),
            expires_at: Utc::now() + Duration::days(7),
        })
        .await
        .unwrap();
    let membership = tenants
        .accept_invite(invite2.id, invitee, invite2.role)
        .await
        .unwrap();
    assert_eq!(membership.role, OrgRole::Responder);

    // Still exactly one membership row for (tenant, user).
    let all = tenants.list_memberships_for_user(invitee).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn accepted_invite_cannot_be_accepted_again_at_store_level() {
    let tenants = MemTenantRepository::new();
    let (tenant, _) = tenants
        .create_tenant_with_owner(
            CreateTenant {
                name: "Acme".into(),
                slug: "acme".into(),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
    let invite = tenants
        .create_invite(CreateInvite {
            tenant_id: tenant.id,
            email: "x@example.com".into(),
            role: OrgRole::Viewer,
            token_hash: "hash".into(),
            expires_at: Utc::now() + Duration::days(7),
        })
        .await
        .unwrap();

    tenants
        .accept_invite(invite.id, Uuid::new_v4(), OrgRole::Viewer)
        .await
        .unwrap();
    let err = tenants
        .accept_invite(invite.id, Uuid::new_v4(), OrgRole::Viewer)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "validation_error");
}

#[tokio::test]
async fn consumed_reset_token_is_gone() {
    let auth = MemAuthRepository::new();
    let user = new_user(&auth, "reset@example.com").await;
    auth.create_password_reset_token(user, "hash".into(), Utc::now() + Duration::minutes(30))
        .await
        .unwrap();

    let first = auth.consume_password_reset_token("hash").await.unwrap();
    assert!(first.is_some());
    let second = auth.consume_password_reset_token("hash").await.unwrap();
    assert!(second.is_none());
}

#[tokio::test]
async fn expired_reset_token_is_not_consumable() {
    let auth = MemAuthRepository::new();
    let user = new_user(&auth, "expired@example.com").await;
    auth.create_password_reset_token(user, "hash".into(), Utc::now() - Duration::minutes(1))
        .await
        .unwrap();
    assert!(auth.consume_password_reset_token("hash").await.unwrap().is_none());
}
