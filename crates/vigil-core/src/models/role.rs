//! Org-level and incident-level role enumerations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tenant-wide organizational role. A user holds exactly one per tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgRole {
    Owner,
    Admin,
    Responder,
    Viewer,
    Billing,
}

impl OrgRole {
    pub const ALL: [OrgRole; 5] = [
        OrgRole::Owner,
        OrgRole::Admin,
        OrgRole::Responder,
        OrgRole::Viewer,
        OrgRole::Billing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrgRole::Owner => "owner",
            OrgRole::Admin => "admin",
            OrgRole::Responder => "responder",
            OrgRole::Viewer => "viewer",
            OrgRole::Billing => "billing",
        }
    }
}

impl fmt::Display for OrgRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-incident responsibility tag, distinct from the org role.
///
/// Used to narrow what a `Responder` may do on a specific incident
/// (e.g. only the commander or comms lead publishes external updates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentRole {
    /// Incident commander.
    Commander,
    /// Communications lead.
    CommsLead,
    /// Operations lead.
    OpsLead,
    /// Subject-matter expert.
    Sme,
}

impl IncidentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentRole::Commander => "commander",
            IncidentRole::CommsLead => "comms_lead",
            IncidentRole::OpsLead => "ops_lead",
            IncidentRole::Sme => "sme",
        }
    }
}

impl fmt::Display for IncidentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
