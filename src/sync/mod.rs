//! Optimistic mutation pipeline: apply locally, commit remotely, resolve.

mod coordinator;

pub use coordinator::SyncCoordinator;

use crate::error::{Error, Result};

/// How the remote commit phase of a mutation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitStatus {
    /// The backend accepted the mutation.
    Committed,
    /// The backend rejected the mutation or was unreachable; the local
    /// change is still in place and visible.
    FailedKept { cause: String },
    /// The backend rejected the mutation or was unreachable; the local
    /// change was reverted.
    FailedRolledBack { cause: String },
}

impl CommitStatus {
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitStatus::Committed)
    }

    /// The failure cause, when there is one. Never empty.
    pub fn cause(&self) -> Option<&str> {
        match self {
            CommitStatus::Committed => None,
            CommitStatus::FailedKept { cause } | CommitStatus::FailedRolledBack { cause } => {
                Some(cause)
            }
        }
    }
}

/// What one coordinated mutation produced: the local apply's result plus
/// how the commit went. A failed commit is data here, not an error.
#[derive(Debug, Clone)]
pub struct MutationOutcome<T> {
    pub value: T,
    pub commit: CommitStatus,
}

impl<T> MutationOutcome<T> {
    pub fn is_committed(&self) -> bool {
        self.commit.is_committed()
    }

    /// Treat a failed commit as a hard [`Error::Sync`].
    pub fn into_result(self) -> Result<T> {
        match self.commit {
            CommitStatus::Committed => Ok(self.value),
            CommitStatus::FailedKept { cause } | CommitStatus::FailedRolledBack { cause } => {
                Err(Error::Sync { cause })
            }
        }
    }
}
