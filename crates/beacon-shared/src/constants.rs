//! Shared constants: collection and field names of the persisted layout,
//! query limits, and display-name fallbacks.

/// Root collection holding one profile document per identity.
pub const COLLECTION_USERS: &str = "users";
/// Per-user subcollection of confirmed friend edges.
pub const COLLECTION_FRIENDS: &str = "friends";
/// Per-user subcollection of incoming friend requests.
pub const COLLECTION_FRIEND_REQUESTS: &str = "friendRequests";
/// Per-user subcollection mirroring requests this user has sent.
pub const COLLECTION_SENT_REQUESTS: &str = "sentRequests";
/// Per-user subcollection of one-sided block records.
pub const COLLECTION_BLOCKED: &str = "blocked";

pub const FIELD_NAME: &str = "name";
pub const FIELD_AVAILABLE: &str = "available";
pub const FIELD_LAST_CHANGED: &str = "lastChanged";
pub const FIELD_ADDED_AT: &str = "addedAt";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_CREATED_AT: &str = "createdAt";
pub const FIELD_BLOCKED_AT: &str = "blockedAt";
pub const FIELD_BLOCKED_BY: &str = "by";

/// The only request status ever written; anything else is filtered at decode.
pub const REQUEST_STATUS_PENDING: &str = "pending";

/// Display-name fallback when a profile has no (or a blank) name.
pub const FALLBACK_NAME: &str = "Friend";
/// Name placeholder stored on the outgoing mirror of a sent request.
pub const OUTGOING_REQUEST_PLACEHOLDER: &str = "Awaiting approval";
/// Name fallback for an incoming request with no name snapshot.
pub const UNKNOWN_REQUESTER_NAME: &str = "Unknown";

/// Maximum cardinality of a documents-by-id query predicate.
pub const ID_FILTER_LIMIT: usize = 10;
/// Maximum number of writes accepted in one atomic batch commit.
pub const BATCH_WRITE_LIMIT: usize = 500;
/// Minimum digit count for a phone number to be a valid identity.
pub const MIN_PHONE_DIGITS: usize = 10;
