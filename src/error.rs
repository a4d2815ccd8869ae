use thiserror::Error;

/// Error taxonomy for the portfolio core.
///
/// `Validation` and `NotFound` are local rejections raised before any state
/// changes. `Auth` covers credential rejection and operations that require an
/// active session. `Sync` means a remote commit failed after the local
/// optimistic apply had already succeeded; the local change is left in place
/// unless the caller asked for rollback.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("remote commit failed: {cause}")]
    Sync { cause: String },
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Wrap a transport failure, preserving the full context chain in the
    /// human-readable cause.
    pub fn sync(err: &anyhow::Error) -> Self {
        Self::Sync {
            cause: format!("{err:#}"),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
