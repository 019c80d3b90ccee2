use thiserror::Error;

/// Errors produced by the store boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not be reached or rejected the operation.
    #[error("Store unreachable: {0}")]
    Unavailable(String),

    /// A documents-by-id query exceeded the predicate cardinality limit.
    #[error("Id filter holds {len} ids, limit is {limit}")]
    IdFilterTooLarge { len: usize, limit: usize },

    /// An atomic batch exceeded the backend's write limit.
    #[error("Batch holds {len} writes, limit is {limit}")]
    BatchTooLarge { len: usize, limit: usize },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
