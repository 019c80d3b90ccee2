use thiserror::Error;

use beacon_shared::ValidationError;
use beacon_store::StoreError;

/// Errors surfaced by the client services.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Input rejected before any store access.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The document store failed; state is unchanged unless stated otherwise.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The external authenticator failed.
    #[error("Authenticator error: {0}")]
    Auth(#[source] anyhow::Error),

    /// Account deletion stopped mid-cascade. Batches before `committed`
    /// were applied atomically; nothing after them was touched.
    #[error("Account deletion aborted after {committed} of {total} batches: {source}")]
    DeletionAborted {
        committed: usize,
        total: usize,
        #[source]
        source: StoreError,
    },

    /// Relationship data was deleted but the identity record at the
    /// authenticator could not be removed. Not retried automatically.
    #[error("Account data deleted but identity record not removed: {0}")]
    IdentityNotDeleted(#[source] anyhow::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
