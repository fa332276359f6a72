use strata_types::TypeError;

/// Errors from settings store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The named setting does not exist.
    #[error("setting not found: {name}")]
    NotFound { name: String },

    /// A registration with this key already exists.
    #[error("already exists: {name}")]
    AlreadyExists { name: String },

    /// A stored value could not be converted to the requested type.
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
