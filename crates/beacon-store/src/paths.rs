//! Typed collection/document paths for the persisted layout.
//!
//! ```text
//! users/{phone}                        -> profile
//! users/{phone}/friends/{other}        -> friend edge half
//! users/{phone}/friendRequests/{from}  -> incoming request
//! users/{phone}/sentRequests/{to}      -> outgoing request mirror
//! users/{phone}/blocked/{other}        -> block record
//! ```

use beacon_shared::constants::{
    COLLECTION_BLOCKED, COLLECTION_FRIENDS, COLLECTION_FRIEND_REQUESTS, COLLECTION_SENT_REQUESTS,
    COLLECTION_USERS,
};
use beacon_shared::PhoneNumber;

/// Path of a collection, e.g. `users` or `users/+1555.../friends`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

/// Path of a single document, e.g. `users/+1555.../friends/+1444...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath(String);

impl CollectionPath {
    /// A document inside this collection.
    pub fn doc(&self, id: &str) -> DocumentPath {
        DocumentPath(format!("{}/{}", self.0, id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `doc` is a direct child of this collection.
    pub fn contains(&self, doc: &DocumentPath) -> bool {
        match doc.0.strip_prefix(&self.0) {
            Some(rest) => {
                rest.starts_with('/') && !rest[1..].is_empty() && !rest[1..].contains('/')
            }
            None => false,
        }
    }
}

impl DocumentPath {
    /// A subcollection under this document.
    pub fn collection(&self, name: &str) -> CollectionPath {
        CollectionPath(format!("{}/{}", self.0, name))
    }

    /// The final path segment (the document id).
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The root `users` collection.
pub fn users() -> CollectionPath {
    CollectionPath(COLLECTION_USERS.to_string())
}

/// Profile document for `phone`.
pub fn profile(phone: &PhoneNumber) -> DocumentPath {
    users().doc(phone.as_str())
}

/// `phone`'s friend-edge subcollection.
pub fn friends_of(phone: &PhoneNumber) -> CollectionPath {
    profile(phone).collection(COLLECTION_FRIENDS)
}

/// The edge half `users/{owner}/friends/{other}`.
pub fn friend_edge(owner: &PhoneNumber, other: &PhoneNumber) -> DocumentPath {
    friends_of(owner).doc(other.as_str())
}

/// `phone`'s incoming-request subcollection.
pub fn incoming_requests_of(phone: &PhoneNumber) -> CollectionPath {
    profile(phone).collection(COLLECTION_FRIEND_REQUESTS)
}

/// Incoming record `users/{target}/friendRequests/{requester}`.
pub fn incoming_request(target: &PhoneNumber, requester: &PhoneNumber) -> DocumentPath {
    incoming_requests_of(target).doc(requester.as_str())
}

/// `phone`'s outgoing-request subcollection.
pub fn outgoing_requests_of(phone: &PhoneNumber) -> CollectionPath {
    profile(phone).collection(COLLECTION_SENT_REQUESTS)
}

/// Outgoing mirror `users/{requester}/sentRequests/{target}`.
pub fn outgoing_request(requester: &PhoneNumber, target: &PhoneNumber) -> DocumentPath {
    outgoing_requests_of(requester).doc(target.as_str())
}

/// `phone`'s block-record subcollection.
pub fn blocked_of(phone: &PhoneNumber) -> CollectionPath {
    profile(phone).collection(COLLECTION_BLOCKED)
}

/// Block record `users/{blocker}/blocked/{blocked}`.
pub fn block_record(blocker: &PhoneNumber, blocked: &PhoneNumber) -> DocumentPath {
    blocked_of(blocker).doc(blocked.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone(s: &str) -> PhoneNumber {
        PhoneNumber::normalize(s).unwrap()
    }

    #[test]
    fn layout_paths() {
        let a = phone("+15550000001");
        let b = phone("+15550000002");

        assert_eq!(profile(&a).as_str(), "users/+15550000001");
        assert_eq!(
            friend_edge(&a, &b).as_str(),
            "users/+15550000001/friends/+15550000002"
        );
        assert_eq!(
            incoming_request(&b, &a).as_str(),
            "users/+15550000002/friendRequests/+15550000001"
        );
        assert_eq!(
            outgoing_request(&a, &b).as_str(),
            "users/+15550000001/sentRequests/+15550000002"
        );
        assert_eq!(
            block_record(&a, &b).as_str(),
            "users/+15550000001/blocked/+15550000002"
        );
    }

    #[test]
    fn collection_contains_direct_children_only() {
        let a = phone("+15550000001");
        let b = phone("+15550000002");

        let coll = friends_of(&a);
        assert!(coll.contains(&friend_edge(&a, &b)));
        // The profile itself is not inside its own subcollection.
        assert!(!coll.contains(&profile(&a)));
        // A nested path under another user is not a direct child.
        assert!(!coll.contains(&friend_edge(&b, &a)));
        // The root users collection holds profiles, not edge halves.
        assert!(users().contains(&profile(&a)));
        assert!(!users().contains(&friend_edge(&a, &b)));
    }

    #[test]
    fn document_id_is_last_segment() {
        let a = phone("+15550000001");
        let b = phone("+15550000002");
        assert_eq!(friend_edge(&a, &b).id(), "+15550000002");
        assert_eq!(profile(&a).id(), "+15550000001");
    }
}
