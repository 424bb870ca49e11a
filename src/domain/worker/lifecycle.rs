//! Worker lifecycle states

use std::fmt;

use serde::Serialize;

/// Lifecycle state of a worker
///
/// `Registered → Installing → Waiting → Activating → Active`, with
/// `Redundant` reachable from `Installing` and `Activating` when a handler
/// fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Registered,
    Installing,
    Waiting,
    Activating,
    Active,
    Redundant,
}

impl WorkerState {
    /// Only an active worker intercepts requests
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Active)
    }

    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;

        matches!(
            (self, next),
            (Registered, Installing)
                | (Installing, Waiting)
                | (Installing, Redundant)
                | (Waiting, Activating)
                | (Activating, Active)
                | (Activating, Redundant)
        )
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Registered => write!(f, "registered"),
            WorkerState::Installing => write!(f, "installing"),
            WorkerState::Waiting => write!(f, "waiting"),
            WorkerState::Activating => write!(f, "activating"),
            WorkerState::Active => write!(f, "active"),
            WorkerState::Redundant => write!(f, "redundant"),
        }
    }
}
