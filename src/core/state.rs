//! Per-package install state
//!
//! Each descriptor in a plan moves through
//! `Pending -> Resolving -> Fetching -> Building -> Installed`, with
//! `Failed` reachable from any non-terminal state. The tracker is shared by
//! the scheduler and its workers.

use std::collections::HashMap;

/// Lifecycle state of one descriptor during an install run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallState {
    /// Not started
    Pending,
    /// Dependency resolution in progress
    Resolving,
    /// Sources and patches being fetched
    Fetching,
    /// Build steps running
    Building,
    /// Published into the prefix
    Installed,
    /// Terminal failure with a reason
    Failed(String),
}

impl InstallState {
    fn rank(&self) -> u8 {
        match self {
            InstallState::Pending => 0,
            InstallState::Resolving => 1,
            InstallState::Fetching => 2,
            InstallState::Building => 3,
            InstallState::Installed => 4,
            InstallState::Failed(_) => 5,
        }
    }

    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, InstallState::Installed | InstallState::Failed(_))
    }

    /// Whether moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: &InstallState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            InstallState::Failed(_) => true,
            _ => next.rank() > self.rank() && !matches!(next, InstallState::Pending),
        }
    }
}

/// Tracks the state of every descriptor in one install run
#[derive(Debug, Default)]
pub struct StateTracker {
    states: HashMap<String, InstallState>,
}

impl StateTracker {
    /// Create a tracker with every named package `Pending`
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            states: names
                .into_iter()
                .map(|n| (n, InstallState::Pending))
                .collect(),
        }
    }

    /// Current state of a package
    pub fn get(&self, name: &str) -> Option<&InstallState> {
        self.states.get(name)
    }

    /// Move a package to a new state.
    ///
    /// Illegal transitions are logged and ignored rather than panicking;
    /// the tracker is bookkeeping, not the source of truth for control
    /// flow.
    pub fn set(&mut self, name: &str, next: InstallState) {
        match self.states.get(name) {
            Some(current) if current.can_transition_to(&next) => {
                tracing::debug!(package = name, ?next, "state transition");
                self.states.insert(name.to_string(), next);
            }
            Some(current) => {
                tracing::warn!(
                    package = name,
                    ?current,
                    ?next,
                    "Ignoring illegal state transition"
                );
            }
            None => {
                tracing::warn!(package = name, "State set for unknown package");
            }
        }
    }

    /// Whether a package reached `Installed`
    pub fn is_installed(&self, name: &str) -> bool {
        matches!(self.states.get(name), Some(InstallState::Installed))
    }

    /// Whether a package reached `Failed`
    pub fn is_failed(&self, name: &str) -> bool {
        matches!(self.states.get(name), Some(InstallState::Failed(_)))
    }
}
