//! Domain model structs projected out of the document store.
//!
//! Every struct derives `Serialize` and `Deserialize` so subscription
//! payloads can be handed directly to a UI layer.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::phone::PhoneNumber;

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// A user's profile document (`users/{phone}`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// Normalized phone number, also the document id.
    pub phone: PhoneNumber,
    /// Display name; defaults to `"Friend"` when unset.
    pub name: String,
    /// Whether the user is currently available.
    pub available: bool,
    /// When `available` last changed (server-assigned).
    pub last_changed: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Friend status (fan-out projection)
// ---------------------------------------------------------------------------

/// One friend's live presence as delivered by the fan-out subscriber.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FriendStatus {
    /// The friend's identity.
    pub phone: PhoneNumber,
    /// Display name snapshot from the friend's profile.
    pub name: String,
    /// Current availability.
    pub available: bool,
    /// Freshness timestamp; entries without one sort last.
    pub last_changed: Option<DateTime<Utc>>,
}

impl FriendStatus {
    /// Freshness ordering: descending `last_changed`, undated entries after
    /// all dated ones, ties broken by name ascending.
    pub fn freshness_order(a: &Self, b: &Self) -> Ordering {
        match (a.last_changed, b.last_changed) {
            (Some(l), Some(r)) => r.cmp(&l).then_with(|| a.name.cmp(&b.name)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.name.cmp(&b.name),
        }
    }
}

// ---------------------------------------------------------------------------
// Friend request
// ---------------------------------------------------------------------------

/// A pending friend request, as seen from either mirror record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FriendRequestEntry {
    /// The counterparty: the requester on incoming records, the target on
    /// outgoing ones.
    pub phone: PhoneNumber,
    /// Name snapshot taken when the request was created.
    pub name: String,
    /// When the request was created (server-assigned).
    pub created_at: Option<DateTime<Utc>>,
}

impl FriendRequestEntry {
    /// Newest-first ordering, undated entries last, name tiebreak.
    pub fn newest_first(a: &Self, b: &Self) -> Ordering {
        match (a.created_at, b.created_at) {
            (Some(l), Some(r)) => r.cmp(&l).then_with(|| a.name.cmp(&b.name)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.name.cmp(&b.name),
        }
    }
}

// ---------------------------------------------------------------------------
// Relationship state
// ---------------------------------------------------------------------------

/// The relationship between an ordered pair of identities.
///
/// Transitions: `None -> Pending -> Friends | None`, `Friends -> None`,
/// and any state `-> Blocked`. Nothing transitions out of `Blocked`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RelationState {
    /// No records exist between the pair.
    None,
    /// A request is pending in at least one direction.
    Pending,
    /// A confirmed, symmetric friend edge exists.
    Friends,
    /// Either side holds a block record against the other.
    Blocked,
}
