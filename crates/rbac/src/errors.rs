use thiserror::Error;

/// Errors surfaced by storage collaborators.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} '{key}' not found")]
    NotFound { kind: &'static str, key: String },
    #[error("{kind} '{key}' already exists")]
    Conflict { kind: &'static str, key: String },
    #[error("invalid {kind}: {reason}")]
    Invalid { kind: &'static str, reason: String },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        StoreError::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub fn conflict(kind: &'static str, key: impl ToString) -> Self {
        StoreError::Conflict {
            kind,
            key: key.to_string(),
        }
    }
}

/// The authorizer only fails when it cannot read the caller's roles; a denial
/// is a normal `Ok(false)`.
#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("role lookup failed: {0}")]
    Lookup(#[from] StoreError),
}
