//! # beacon-shared
//!
//! Domain types shared across the Beacon workspace: the normalized phone
//! identity, the profile / request / relationship models, and the
//! validation errors raised before any store access.

pub mod constants;
pub mod phone;
pub mod types;

mod error;

pub use error::ValidationError;
pub use phone::PhoneNumber;
pub use types::*;
