//! The RBAC policy engine.
//!
//! A pure, synchronous decision function: (action, caller roles, optional
//! incident-role context) → allow/deny. The action set is a closed
//! enumeration and every action maps to exactly one statically
//! constructed rule — exhaustiveness is enforced by the `match` in
//! [`PolicyRule::for_action`] and re-checked by a test over
//! [`Action::ALL`].
//!
//! Denials carry a generic reason naming only the action, never which
//! role would have been required, to avoid leaking role topology.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{VigilError, VigilResult};
use crate::models::role::{IncidentRole, OrgRole};

/// Closed enumeration of permission checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    TenantUpdate,
    TenantDelete,
    MembersList,
    MembersInvite,
    MembersRemove,
    MembersChangeRole,
    ServicesRead,
    ServicesManage,
    IncidentsRead,
    IncidentsCreate,
    IncidentsUpdate,
    IncidentsResolve,
    IncidentsChangeSeverity,
    TimelineRead,
    TimelineAppend,
    UpdatesRead,
    UpdatesPublishInternal,
    UpdatesPublishExternal,
    TasksRead,
    TasksCreate,
    TasksUpdate,
    PostmortemsRead,
    PostmortemsEdit,
    ApiKeysRead,
    ApiKeysManage,
    WebhooksManage,
    AuditLogRead,
    ExportData,
    BillingRead,
    BillingManage,
}

impl Action {
    /// Every action, for exhaustiveness tests and table dumps.
    pub const ALL: [Action; 30] = [
        Action::TenantUpdate,
        Action::TenantDelete,
        Action::MembersList,
        Action::MembersInvite,
        Action::MembersRemove,
        Action::MembersChangeRole,
        Action::ServicesRead,
        Action::ServicesManage,
        Action::IncidentsRead,
        Action::IncidentsCreate,
        Action::IncidentsUpdate,
        Action::IncidentsResolve,
        Action::IncidentsChangeSeverity,
        Action::TimelineRead,
        Action::TimelineAppend,
        Action::UpdatesRead,
        Action::UpdatesPublishInternal,
        Action::UpdatesPublishExternal,
        Action::TasksRead,
        Action::TasksCreate,
        Action::TasksUpdate,
        Action::PostmortemsRead,
        Action::PostmortemsEdit,
        Action::ApiKeysRead,
        Action::ApiKeysManage,
        Action::WebhooksManage,
        Action::AuditLogRead,
        Action::ExportData,
        Action::BillingRead,
        Action::BillingManage,
    ];

    /// Dotted name used in denial reasons and audit entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::TenantUpdate => "tenant.update",
            Action::TenantDelete => "tenant.delete",
            Action::MembersList => "members.list",
            Action::MembersInvite => "members.invite",
            Action::MembersRemove => "members.remove",
            Action::MembersChangeRole => "members.change_role",
            Action::ServicesRead => "services.read",
            Action::ServicesManage => "services.manage",
            Action::IncidentsRead => "incidents.read",
            Action::IncidentsCreate => "incidents.create",
            Action::IncidentsUpdate => "incidents.update",
            Action::IncidentsResolve => "incidents.resolve",
            Action::IncidentsChangeSeverity => "incidents.change_severity",
            Action::TimelineRead => "timeline.read",
            Action::TimelineAppend => "timeline.append",
            Action::UpdatesRead => "updates.read",
            Action::UpdatesPublishInternal => "updates.publish_internal",
            Action::UpdatesPublishExternal => "updates.publish_external",
            Action::TasksRead => "tasks.read",
            Action::TasksCreate => "tasks.create",
            Action::TasksUpdate => "tasks.update",
            Action::PostmortemsRead => "postmortems.read",
            Action::PostmortemsEdit => "postmortems.edit",
            Action::ApiKeysRead => "api_keys.read",
            Action::ApiKeysManage => "api_keys.manage",
            Action::WebhooksManage => "webhooks.manage",
            Action::AuditLogRead => "audit_log.read",
            Action::ExportData => "export.data",
            Action::BillingRead => "billing.read",
            Action::BillingManage => "billing.manage",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rule per action: which org roles may perform it, and — when the
/// Responder role is further narrowed — which incident roles a
/// Responder must additionally hold.
#[derive(Debug, Clone)]
pub struct PolicyRule {
    pub allowed_roles: &'static [OrgRole],
    /// When set, a caller passing only via the `Responder` org role must
    /// also hold at least one of these incident-scoped roles. All other
    /// org roles bypass this narrowing.
    pub responder_incident_roles: Option<&'static [IncidentRole]>,
}

use IncidentRole::{Commander, CommsLead, OpsLead, Sme};
use OrgRole::{Admin, Billing, Owner, Responder, Viewer};

const MANAGERS: &[OrgRole] = &[Owner, Admin];
const RESPONDERS_UP: &[OrgRole] = &[Owner, Admin, Responder];
const READERS: &[OrgRole] = &[Owner, Admin, Responder, Viewer];
const BILLING_READERS: &[OrgRole] = &[Owner, Billing];

impl PolicyRule {
    /// The statically constructed policy table.
    pub fn for_action(action: Action) -> PolicyRule {
        let (allowed_roles, responder_incident_roles): (
            &'static [OrgRole],
            Option<&'static [IncidentRole]>,
        ) = match action {
            Action::TenantUpdate => (MANAGERS, None),
            Action::TenantDelete => (&[Owner], None),
            Action::MembersList => (READERS, None),
            Action::MembersInvite => (MANAGERS, None),
            Action::MembersRemove => (MANAGERS, None),
            Action::MembersChangeRole => (MANAGERS, None),
            Action::ServicesRead => (READERS, None),
            Action::ServicesManage => (MANAGERS, None),
            Action::IncidentsRead => (READERS, None),
            Action::IncidentsCreate => (RESPONDERS_UP, None),
            Action::IncidentsUpdate => (RESPONDERS_UP, None),
            // Only the commander closes out an incident a Responder is on.
            Action::IncidentsResolve => (RESPONDERS_UP, Some(&[Commander])),
            Action::IncidentsChangeSeverity => (RESPONDERS_UP, Some(&[Commander, OpsLead])),
            Action::TimelineRead => (READERS, None),
            Action::TimelineAppend => (RESPONDERS_UP, None),
            Action::UpdatesRead => (READERS, None),
            Action::UpdatesPublishInternal => {
                (RESPONDERS_UP, Some(&[Commander, CommsLead, OpsLead, Sme]))
            }
            Action::UpdatesPublishExternal => (RESPONDERS_UP, Some(&[Commander, CommsLead])),
            Action::TasksRead => (READERS, None),
            Action::TasksCreate => (RESPONDERS_UP, None),
            Action::TasksUpdate => (RESPONDERS_UP, None),
            Action::PostmortemsRead => (READERS, None),
            Action::PostmortemsEdit => (RESPONDERS_UP, Some(&[Commander, OpsLead, Sme])),
            Action::ApiKeysRead => (MANAGERS, None),
            Action::ApiKeysManage => (MANAGERS, None),
            Action::WebhooksManage => (MANAGERS, None),
            Action::AuditLogRead => (MANAGERS, None),
            Action::ExportData => (MANAGERS, None),
            Action::BillingRead => (BILLING_READERS, None),
            Action::BillingManage => (BILLING_READERS, None),
        };
        PolicyRule {
            allowed_roles,
            responder_incident_roles,
        }
    }
}

/// The caller's identity as the policy engine sees it: org roles within
/// the active tenant. A principal holds one org role per tenant in this
/// model, but the check is role-set-general.
#[derive(Debug, Clone)]
pub struct PolicySubject {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub roles: BTreeSet<OrgRole>,
}

impl PolicySubject {
    pub fn new(user_id: Uuid, tenant_id: Uuid, role: OrgRole) -> Self {
        PolicySubject {
            user_id,
            tenant_id,
            roles: BTreeSet::from([role]),
        }
    }
}

/// Incident-scoped role context supplied when the target is an incident.
#[derive(Debug, Clone, Default)]
pub struct ResourceContext {
    pub incident_roles: BTreeSet<IncidentRole>,
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone)]
pub struct Decision {
    pub allowed: bool,
    /// Present only on denial; names the action, never the roles.
    pub reason: Option<String>,
}

/// Evaluate the policy table. Pure and synchronous.
pub fn authorize(
    action: Action,
    subject: &PolicySubject,
    resource: Option<&ResourceContext>,
) -> Decision {
    let rule = PolicyRule::for_action(action);
    for role in &subject.roles {
        if !rule.allowed_roles.contains(role) {
            continue;
        }
        // The Responder org role may be narrowed to incident roles;
        // every other allowed role passes unconditionally.
        if *role == OrgRole::Responder {
            if let Some(required) = rule.responder_incident_roles {
                let held = resource.map(|r| &r.incident_roles);
                let intersects = held
                    .map(|h| required.iter().any(|r| h.contains(r)))
                    .unwrap_or(false);
                if !intersects {
                    continue;
                }
            }
        }
        return Decision {
            allowed: true,
            reason: None,
        };
    }
    Decision {
        allowed: false,
        reason: Some(format!("not permitted to perform {action}")),
    }
}

/// Like [`authorize`] but raises `PermissionDenied` on deny.
pub fn assert_authorized(
    action: Action,
    subject: &PolicySubject,
    resource: Option<&ResourceContext>,
) -> VigilResult<()> {
    let decision = authorize(action, subject, resource);
    if decision.allowed {
        Ok(())
    } else {
        Err(VigilError::PermissionDenied {
            reason: decision
                .reason
                .unwrap_or_else(|| format!("not permitted to perform {action}")),
        })
    }
}
