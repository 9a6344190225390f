//! Per-entity lifecycle as seen by the orchestrators
//!
//! `Absent → Creating → Present → Updating → Present → Deleting → Absent`.
//! Creating and Updating may loop on retry. The enum is used for structured
//! log fields and for asserting transitions in tests.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Not present remotely
    Absent,
    /// Create request in flight or retrying
    Creating,
    /// Exists remotely
    Present,
    /// Update in flight or retrying
    Updating,
    /// Delete in flight or retrying
    Deleting,
}

impl Lifecycle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Creating => "creating",
            Self::Present => "present",
            Self::Updating => "updating",
            Self::Deleting => "deleting",
        }
    }

    /// Whether `next` is a legal successor of `self`.
    ///
    /// Terminal failures fall back: a failed create returns to `Absent`, a
    /// failed update or delete returns to `Present`.
    pub fn can_transition_to(self, next: Self) -> bool {
        use Lifecycle::{Absent, Creating, Deleting, Present, Updating};
        matches!(
            (self, next),
            (Absent, Creating)
                | (Creating, Creating | Present | Absent)
                | (Present, Updating | Deleting | Absent)
                | (Updating, Updating | Present)
                | (Deleting, Absent | Present)
        )
    }

    /// State the entity lands in when an operation in `self` fails terminally.
    pub fn on_failure(self) -> Self {
        match self {
            Self::Creating | Self::Absent => Self::Absent,
            Self::Updating | Self::Deleting | Self::Present => Self::Present,
        }
    }
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
