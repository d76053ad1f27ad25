//! Incident status state machine.
//!
//! The transition table is the single source of truth for which status
//! edges exist. A same-status "transition" is always a no-op success;
//! `Closed` is terminal.

use crate::error::{VigilError, VigilResult};
use crate::models::incident::IncidentStatus;
use crate::policy::Action;

/// Statuses reachable from `from` in one step, excluding the self edge.
pub fn allowed_targets(from: IncidentStatus) -> &'static [IncidentStatus] {
    use IncidentStatus::*;
    match from {
        Declared => &[Investigating, Mitigating, Monitoring, Resolved],
        Investigating => &[Mitigating, Monitoring, Resolved],
        Mitigating => &[Monitoring, Resolved],
        Monitoring => &[Resolved],
        Resolved => &[Closed],
        Closed => &[],
    }
}

/// Whether `from → to` is a valid edge (self edges count).
pub fn can_transition(from: IncidentStatus, to: IncidentStatus) -> bool {
    from == to || allowed_targets(from).contains(&to)
}

/// Validate an edge, or fail with `StatusTransitionInvalid` naming both
/// endpoints.
pub fn validate_transition(from: IncidentStatus, to: IncidentStatus) -> VigilResult<()> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(VigilError::StatusTransitionInvalid {
            from: from.as_str().into(),
            to: to.as_str().into(),
        })
    }
}

/// The extra permission a status change demands on top of the base
/// `incidents.update`, if any. Entering `Resolved` or `Closed` requires
/// the stronger resolve permission.
pub fn extra_permission_for(to: IncidentStatus) -> Option<Action> {
    match to {
        IncidentStatus::Resolved | IncidentStatus::Closed => Some(Action::IncidentsResolve),
        _ => None,
    }
}
