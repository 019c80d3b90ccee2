//! In-process [`DocumentStore`] implementation.
//!
//! Backs tests and embedded use. Snapshots are delivered synchronously on
//! the task that performed the mutating call, which gives the single
//! delivery context the services assume. A fault toggle simulates an
//! unreachable backend: every operation fails and nothing is applied.
//! Narrower fault helpers fail only commits past a budget, or only new
//! subscription opens.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use beacon_shared::constants::{BATCH_WRITE_LIMIT, ID_FILTER_LIMIT};

use crate::client::{DocumentStore, Query, QuerySnapshot, SnapshotHandler, Subscription};
use crate::document::{Document, FieldValue, Fields, WriteBatch, WriteOp};
use crate::error::{Result, StoreError};
use crate::paths::{CollectionPath, DocumentPath};

struct Watcher {
    query: Query,
    handler: SnapshotHandler,
}

struct Inner {
    /// All documents, keyed by full path. BTreeMap keeps snapshots ordered.
    docs: RwLock<BTreeMap<DocumentPath, BTreeMap<String, Value>>>,
    watchers: Mutex<HashMap<u64, Watcher>>,
    next_watcher_id: AtomicU64,
    unavailable: AtomicBool,
    /// Remaining commits before `commit` starts failing; negative means
    /// unlimited.
    commit_budget: AtomicI64,
    subscribe_unavailable: AtomicBool,
}

/// An in-memory document store with live subscriptions.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                docs: RwLock::new(BTreeMap::new()),
                watchers: Mutex::new(HashMap::new()),
                next_watcher_id: AtomicU64::new(1),
                unavailable: AtomicBool::new(false),
                commit_budget: AtomicI64::new(-1),
                subscribe_unavailable: AtomicBool::new(false),
            }),
        }
    }

    /// Simulate a network outage: while set, every operation returns
    /// [`StoreError::Unavailable`] and mutates nothing.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Let the next `n` commits succeed, then fail every later commit as
    /// if the backend went away mid-sequence. Reads, writes, and
    /// subscriptions are unaffected.
    pub fn fail_after_commits(&self, n: usize) {
        self.inner.commit_budget.store(n as i64, Ordering::SeqCst);
    }

    /// Refuse new subscription opens; everything else keeps working.
    pub fn set_subscribe_unavailable(&self, unavailable: bool) {
        self.inner
            .subscribe_unavailable
            .store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored documents (test helper).
    pub fn doc_count(&self) -> usize {
        self.inner.docs.read().expect("store lock poisoned").len()
    }

    /// Whether a document currently exists (test helper).
    pub fn exists(&self, path: &DocumentPath) -> bool {
        self.inner
            .docs
            .read()
            .expect("store lock poisoned")
            .contains_key(path)
    }

    fn check_available(&self) -> Result<()> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated outage".into()));
        }
        Ok(())
    }

    /// Apply a list of writes under the write lock, then notify watchers.
    fn apply(&self, ops: Vec<WriteOp>) -> Result<()> {
        self.check_available()?;

        let changed: Vec<DocumentPath> = ops.iter().map(|op| op.path().clone()).collect();
        {
            let mut docs = self.inner.docs.write().expect("store lock poisoned");
            for op in ops {
                match op {
                    WriteOp::SetMerge { path, fields } => {
                        let entry = docs.entry(path).or_default();
                        for (name, value) in fields {
                            entry.insert(name, resolve(value));
                        }
                    }
                    WriteOp::Delete { path } => {
                        docs.remove(&path);
                    }
                }
            }
        }
        self.notify(&changed);
        Ok(())
    }

    /// Invoke every watcher whose query is affected by one of `changed`.
    ///
    /// Handlers run outside all locks, so a handler may re-enter the store
    /// (the fan-out subscriber opens new subscriptions from inside one).
    fn notify(&self, changed: &[DocumentPath]) {
        let interested: Vec<(Query, SnapshotHandler)> = {
            let watchers = self.inner.watchers.lock().expect("watcher lock poisoned");
            watchers
                .values()
                .filter(|w| changed.iter().any(|path| w.query.matches(path)))
                .map(|w| (w.query.clone(), Arc::clone(&w.handler)))
                .collect()
        };

        for (query, handler) in interested {
            let snapshot = self.snapshot(&query);
            handler(snapshot);
        }
    }

    /// Current result set for a query.
    fn snapshot(&self, query: &Query) -> QuerySnapshot {
        let docs = self.inner.docs.read().expect("store lock poisoned");
        let documents = docs
            .iter()
            .filter(|(path, _)| query.matches(path))
            .map(|(path, fields)| Document {
                path: path.clone(),
                fields: fields.clone(),
            })
            .collect();
        QuerySnapshot { documents }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve write sentinels to concrete stored values.
fn resolve(value: FieldValue) -> Value {
    match value {
        FieldValue::Value(v) => v,
        FieldValue::ServerTimestamp => Value::String(Utc::now().to_rfc3339()),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>> {
        self.check_available()?;
        let docs = self.inner.docs.read().expect("store lock poisoned");
        Ok(docs.get(path).map(|fields| Document {
            path: path.clone(),
            fields: fields.clone(),
        }))
    }

    async fn set_merge(&self, path: &DocumentPath, fields: Fields) -> Result<()> {
        self.apply(vec![WriteOp::SetMerge {
            path: path.clone(),
            fields,
        }])
    }

    async fn delete(&self, path: &DocumentPath) -> Result<()> {
        self.apply(vec![WriteOp::Delete { path: path.clone() }])
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>> {
        self.check_available()?;
        Ok(self
            .snapshot(&Query::Collection(collection.clone()))
            .documents)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        if batch.len() > BATCH_WRITE_LIMIT {
            return Err(StoreError::BatchTooLarge {
                len: batch.len(),
                limit: BATCH_WRITE_LIMIT,
            });
        }
        let budget = self.inner.commit_budget.load(Ordering::SeqCst);
        if budget >= 0 {
            if budget == 0 {
                return Err(StoreError::Unavailable("commit budget exhausted".into()));
            }
            self.inner.commit_budget.fetch_sub(1, Ordering::SeqCst);
        }
        debug!(writes = batch.len(), "committing batch");
        self.apply(batch.into_ops())
    }

    fn subscribe(&self, query: Query, handler: SnapshotHandler) -> Result<Subscription> {
        self.check_available()?;
        if self.inner.subscribe_unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("subscriptions refused".into()));
        }
        if let Query::DocumentsById(_, ids) = &query {
            if ids.len() > ID_FILTER_LIMIT {
                return Err(StoreError::IdFilterTooLarge {
                    len: ids.len(),
                    limit: ID_FILTER_LIMIT,
                });
            }
        }

        let id = self.inner.next_watcher_id.fetch_add(1, Ordering::SeqCst);
        debug!(watcher = id, query = ?query, "opening subscription");
        {
            let mut watchers = self.inner.watchers.lock().expect("watcher lock poisoned");
            watchers.insert(
                id,
                Watcher {
                    query: query.clone(),
                    handler: Arc::clone(&handler),
                },
            );
        }

        // First callback fires with the current state.
        handler(self.snapshot(&query));

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        Ok(Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                let mut watchers = inner.watchers.lock().expect("watcher lock poisoned");
                watchers.remove(&id);
            }
        }))
    }
}
