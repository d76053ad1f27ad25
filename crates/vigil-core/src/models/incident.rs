//! Incident domain model and its child records.
//!
//! Incidents are owned exclusively by their tenant. Timeline events and
//! status updates are append-only; tasks are mutable.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Incident severity, SEV1 most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Sev1,
    Sev2,
    Sev3,
    Sev4,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Sev1 => "sev1",
            Severity::Sev2 => "sev2",
            Severity::Sev3 => "sev3",
            Severity::Sev4 => "sev4",
        };
        f.write_str(s)
    }
}

/// Incident lifecycle status. Transitions are validated by
/// [`crate::lifecycle`]; incidents are created in `Declared` and
/// `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Declared,
    Investigating,
    Mitigating,
    Monitoring,
    Resolved,
    Closed,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Declared => "declared",
            IncidentStatus::Investigating => "investigating",
            IncidentStatus::Mitigating => "mitigating",
            IncidentStatus::Monitoring => "monitoring",
            IncidentStatus::Resolved => "resolved",
            IncidentStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub status: IncidentStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Deduplicated, trimmed, order-insensitive set of service names.
    pub impacted_services: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateIncident {
    pub tenant_id: Uuid,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub start_time: DateTime<Utc>,
    pub impacted_services: BTreeSet<String>,
}

/// Patch applied to an existing incident. `None` fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateIncident {
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<Severity>,
    pub status: Option<IncidentStatus>,
    pub end_time: Option<DateTime<Utc>>,
    pub impacted_services: Option<BTreeSet<String>>,
}

/// Append-only timeline entry on an incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub incident_id: Uuid,
    pub author_user_id: Option<Uuid>,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTimelineEvent {
    pub tenant_id: Uuid,
    pub incident_id: Uuid,
    pub author_user_id: Option<Uuid>,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Done,
}

/// A mutable follow-up item on an incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentTask {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub incident_id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub assignee_user_id: Option<Uuid>,
    pub due_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateIncidentTask {
    pub tenant_id: Uuid,
    pub incident_id: Uuid,
    pub title: String,
    pub assignee_user_id: Option<Uuid>,
    pub due_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateIncidentTask {
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
    pub assignee_user_id: Option<Option<Uuid>>,
    pub due_at: Option<Option<DateTime<Utc>>>,
}

/// Audience of a status update: internal responders or the external
/// status page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateAudience {
    Internal,
    External,
}

/// Append-only status update published on an incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub incident_id: Uuid,
    pub author_user_id: Option<Uuid>,
    pub audience: UpdateAudience,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateStatusUpdate {
    pub tenant_id: Uuid,
    pub incident_id: Uuid,
    pub author_user_id: Option<Uuid>,
    pub audience: UpdateAudience,
    pub body: String,
}
