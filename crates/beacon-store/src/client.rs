//! The [`DocumentStore`] trait: the injected backend boundary.
//!
//! Implementations wrap a hosted document database. Every service in the
//! workspace takes an `Arc<dyn DocumentStore>` rather than reaching for an
//! ambient singleton, so a fake store can be injected in tests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::document::{Document, Fields, WriteBatch};
use crate::error::Result;
use crate::paths::{CollectionPath, DocumentPath};

/// A live query the store can push snapshots for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// A single document; snapshots hold zero or one documents.
    Doc(DocumentPath),
    /// All direct children of a collection.
    Collection(CollectionPath),
    /// Documents of a collection whose id is in the given set.
    ///
    /// Backends cap the set size (see
    /// [`ID_FILTER_LIMIT`](beacon_shared::constants::ID_FILTER_LIMIT));
    /// larger member sets must be chunked by the caller.
    DocumentsById(CollectionPath, Vec<String>),
}

impl Query {
    /// Whether a change to `path` affects this query's result set.
    pub fn matches(&self, path: &DocumentPath) -> bool {
        match self {
            Self::Doc(p) => p == path,
            Self::Collection(c) => c.contains(path),
            Self::DocumentsById(c, ids) => {
                c.contains(path) && ids.iter().any(|id| id == path.id())
            }
        }
    }
}

/// The current result set of a subscribed query.
#[derive(Debug, Clone, Default)]
pub struct QuerySnapshot {
    /// Matching documents, ordered by path.
    pub documents: Vec<Document>,
}

/// Callback invoked with the initial state and on every subsequent change.
///
/// The store guarantees a single delivery context: handlers are never
/// invoked concurrently with one another.
pub type SnapshotHandler = Arc<dyn Fn(QuerySnapshot) + Send + Sync>;

/// Cancellation handle for a live subscription.
///
/// The owning component must cancel every subscription it opened when the
/// corresponding scope ends; dropping the handle cancels as well.
pub struct Subscription {
    canceller: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a cancel closure produced by a store implementation.
    pub fn new(canceller: impl FnOnce() + Send + 'static) -> Self {
        Self {
            canceller: Some(Box::new(canceller)),
        }
    }

    /// Stop the feed. No callbacks are delivered after this returns.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.canceller.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.canceller.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.canceller.is_some())
            .finish()
    }
}

/// A keyed-document database reachable over the network.
///
/// Atomicity of [`commit`](Self::commit) is the only ordering primitive the
/// application relies on; per-document writes are last-write-wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read. `Ok(None)` when the document does not exist.
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>>;

    /// Upsert merging only the named fields.
    async fn set_merge(&self, path: &DocumentPath, fields: Fields) -> Result<()>;

    /// Delete a document. Deleting an absent document succeeds.
    async fn delete(&self, path: &DocumentPath) -> Result<()>;

    /// Read all direct children of a collection.
    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>>;

    /// Atomic multi-document commit: all writes apply or none do.
    async fn commit(&self, batch: WriteBatch) -> Result<()>;

    /// Open a live feed for `query`. The first callback fires with the
    /// current state before any change is delivered.
    fn subscribe(&self, query: Query, handler: SnapshotHandler) -> Result<Subscription>;
}
