//! Host lifecycle phases as seen by stores.

use serde::{Deserialize, Serialize};

/// Shutdown progress of the host application.
///
/// Owned by the host. Stores only read it: saves are dropped while
/// `Stopping`, and `FinalWrite` is the last chance to flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    #[default]
    Running,
    Stopping,
    FinalWrite,
}

impl LifecyclePhase {
    /// Whether writes must be suppressed in this phase.
    pub const fn suppresses_writes(self) -> bool {
        matches!(self, Self::Stopping)
    }
}

impl std::fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
            Self::FinalWrite => write!(f, "final_write"),
        }
    }
}
