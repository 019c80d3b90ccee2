use thiserror::Error;

/// Input validation errors, raised before any store call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The phone number contained fewer than 10 digits after normalization.
    #[error("Invalid phone number: at least 10 digits required")]
    InvalidPhoneNumber,

    /// A friend request targeted the requester's own identity.
    #[error("Cannot send a friend request to yourself")]
    SelfRequest,
}
