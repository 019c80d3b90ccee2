//! Typed decode boundary from raw documents to domain entities.
//!
//! All duck-typed field access happens here, with explicit defaults for
//! optional fields: a missing `available` is `false`, a missing or blank
//! `name` falls back per call site, and unparsable timestamps decode to
//! `None`. Request records whose `status` is not `"pending"` are dropped.

use beacon_shared::constants::{
    FALLBACK_NAME, FIELD_AVAILABLE, FIELD_CREATED_AT, FIELD_LAST_CHANGED, FIELD_NAME, FIELD_STATUS,
    REQUEST_STATUS_PENDING,
};
use beacon_shared::{FriendRequestEntry, FriendStatus, PhoneNumber, Profile};

use crate::document::Document;

/// Decode a profile document into a [`FriendStatus`] snapshot.
///
/// The document id is trusted as an already-normalized identity; documents
/// with a malformed id are skipped.
pub fn friend_status(doc: &Document) -> Option<FriendStatus> {
    let phone = PhoneNumber::normalize(doc.id()).ok()?;
    Some(FriendStatus {
        phone,
        name: name_or(doc, FALLBACK_NAME),
        available: doc.bool_or(FIELD_AVAILABLE, false),
        last_changed: doc.timestamp(FIELD_LAST_CHANGED),
    })
}

/// Decode a profile document.
pub fn profile(doc: &Document) -> Option<Profile> {
    let phone = PhoneNumber::normalize(doc.id()).ok()?;
    Some(Profile {
        phone,
        name: name_or(doc, FALLBACK_NAME),
        available: doc.bool_or(FIELD_AVAILABLE, false),
        last_changed: doc.timestamp(FIELD_LAST_CHANGED),
    })
}

/// Decode a request record (incoming or outgoing mirror).
///
/// Returns `None` for malformed ids and for records that are not pending.
pub fn friend_request(doc: &Document, name_fallback: &str) -> Option<FriendRequestEntry> {
    if doc.string(FIELD_STATUS) != Some(REQUEST_STATUS_PENDING) {
        return None;
    }
    let phone = PhoneNumber::normalize(doc.id()).ok()?;
    Some(FriendRequestEntry {
        phone,
        name: name_or(doc, name_fallback),
        created_at: doc.timestamp(FIELD_CREATED_AT),
    })
}

/// Display name with a fallback for absent or blank values.
pub fn name_or(doc: &Document, fallback: &str) -> String {
    match doc.string(FIELD_NAME) {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => fallback.to_string(),
    }
}
