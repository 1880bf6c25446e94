// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Load session states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one acquisition attempt
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Default, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// State of the load controller
///
/// ```text
/// Idle -> Resolving -> Loading -> Attaching -> Idle
///              |           |
///              |           +-> Failed -> Idle
///              +-> Cancelled -> Idle
///              +-> Failed -> Idle
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum LoadState {
    #[default]
    Idle,
    Resolving,
    Loading,
    Attaching,
    Failed,
    Cancelled,
}

impl LoadState {
    /// Whether a transition from `self` to `next` is allowed
    pub fn can_transition_to(self, next: LoadState) -> bool {
        use LoadState::*;
        matches!(
            (self, next),
            (Idle, Resolving)
                | (Resolving, Loading)
                | (Resolving, Cancelled)
                | (Resolving, Failed)
                | (Loading, Attaching)
                | (Loading, Failed)
                | (Attaching, Idle)
                | (Failed, Idle)
                | (Cancelled, Idle)
        )
    }

    pub fn is_idle(self) -> bool {
        self == LoadState::Idle
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadState::Idle => "Idle",
            LoadState::Resolving => "Resolving",
            LoadState::Loading => "Loading",
            LoadState::Attaching => "Attaching",
            LoadState::Failed => "Failed",
            LoadState::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_transitions() {
        assert!(LoadState::Idle.can_transition_to(LoadState::Resolving));
        assert!(LoadState::Loading.can_transition_to(LoadState::Attaching));
        assert!(LoadState::Cancelled.can_transition_to(LoadState::Idle));
    }

    #[test]
    fn test_rejected_transitions() {
        // Loading cannot be cancelled mid-flight
        assert!(!LoadState::Loading.can_transition_to(LoadState::Cancelled));
        assert!(!LoadState::Idle.can_transition_to(LoadState::Attaching));
        assert!(!LoadState::Attaching.can_transition_to(LoadState::Failed));
    }
}
