//! # beacon-client
//!
//! The presence-sharing services: own-status reads/writes and
//! subscriptions ([`presence`]), the friend-request state machine
//! ([`friends`]), the live friend-presence fan-out ([`roster`]), and
//! cascading account deletion ([`account`]).
//!
//! Every service takes the document store and the external authenticator
//! as injected `Arc<dyn ...>` collaborators; nothing here caches
//! authoritative state, all in-memory views are projections rebuilt from
//! live subscriptions.

pub mod account;
pub mod auth;
pub mod friends;
pub mod presence;
pub mod roster;

mod error;

pub use account::AccountService;
pub use auth::{IdentityProvider, StaticIdentity};
pub use error::{ClientError, Result};
pub use friends::FriendService;
pub use presence::PresenceService;
pub use roster::{Roster, RosterHandle};
