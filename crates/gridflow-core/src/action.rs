use serde::{Deserialize, Serialize};

/// Whether a resource operation is a dry-run probe or a committing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Report the outcome without changing any state.
    Simulate,
    /// Perform the operation.
    Execute,
}

impl Action {
    pub fn execute(self) -> bool {
        self == Action::Execute
    }

    pub fn simulate(self) -> bool {
        self == Action::Simulate
    }

    /// `Execute` when `execute` is true, otherwise `Simulate`.
    pub fn get(execute: bool) -> Action {
        if execute {
            Action::Execute
        } else {
            Action::Simulate
        }
    }
}
