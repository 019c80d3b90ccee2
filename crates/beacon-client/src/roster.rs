//! Live friend-presence fan-out.
//!
//! The edge collection is the source of truth for membership. On every
//! membership change the member list is recomputed from the snapshot,
//! partitioned into id-filter-sized chunks, and one profile subscription
//! is opened per chunk; all previously opened chunk subscriptions are
//! cancelled first. Chunk feeds run independently and may interleave
//! arbitrarily, so every delivery merges into a per-key map, drops entries
//! that are no longer members, and re-sorts the full view by freshness.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use beacon_shared::constants::ID_FILTER_LIMIT;
use beacon_shared::{FriendStatus, PhoneNumber};
use beacon_store::{decode, paths, DocumentStore, Query, Subscription};

use crate::error::Result;

/// Callback receiving the full, freshness-sorted friend list on every
/// contributing change.
pub type RosterHandler = Arc<dyn Fn(Vec<FriendStatus>) + Send + Sync>;

/// Opens live friend-presence views.
pub struct Roster {
    store: Arc<dyn DocumentStore>,
}

struct RosterInner {
    store: Arc<dyn DocumentStore>,
    /// Current member ids, recomputed from every edge snapshot.
    members: Mutex<Vec<String>>,
    /// Last-write-per-key merge of all chunk feeds.
    merged: Mutex<HashMap<String, FriendStatus>>,
    /// Open chunk subscriptions; replaced wholesale on membership change.
    chunk_subs: Mutex<Vec<Subscription>>,
    /// Set when a chunk subscription failed to open; members of that
    /// chunk receive no live updates until the next rebuild.
    degraded: AtomicBool,
    on_change: RosterHandler,
}

impl Roster {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Start watching `me`'s friends. The first delivery fires with the
    /// current state before this returns.
    pub fn watch(
        &self,
        me: &PhoneNumber,
        on_change: impl Fn(Vec<FriendStatus>) + Send + Sync + 'static,
    ) -> Result<RosterHandle> {
        let inner = Arc::new(RosterInner {
            store: Arc::clone(&self.store),
            members: Mutex::new(Vec::new()),
            merged: Mutex::new(HashMap::new()),
            chunk_subs: Mutex::new(Vec::new()),
            degraded: AtomicBool::new(false),
            on_change: Arc::new(on_change),
        });

        let handler_inner = Arc::clone(&inner);
        let edge_sub = self.store.subscribe(
            Query::Collection(paths::friends_of(me)),
            Arc::new(move |snapshot| {
                let members: Vec<String> = snapshot
                    .documents
                    .iter()
                    .map(|doc| doc.id().to_string())
                    .collect();
                handler_inner.rebuild(members);
            }),
        )?;

        Ok(RosterHandle {
            edge_sub: Some(edge_sub),
            inner,
        })
    }
}

impl RosterInner {
    /// React to a membership change: tear down every chunk subscription,
    /// reset the merge state, and re-subscribe chunk by chunk.
    fn rebuild(self: &Arc<Self>, members: Vec<String>) {
        let old_subs: Vec<Subscription> = {
            let mut subs = self.chunk_subs.lock().expect("roster lock poisoned");
            subs.drain(..).collect()
        };
        for sub in old_subs {
            sub.cancel();
        }

        debug!(members = members.len(), "rebuilding presence fan-out");
        *self.members.lock().expect("roster lock poisoned") = members.clone();
        self.merged.lock().expect("roster lock poisoned").clear();
        self.degraded.store(false, Ordering::SeqCst);

        if members.is_empty() {
            (self.on_change)(Vec::new());
            return;
        }

        for chunk in members.chunks(ID_FILTER_LIMIT) {
            let chunk_inner = Arc::clone(self);
            let result = self.store.subscribe(
                Query::DocumentsById(paths::users(), chunk.to_vec()),
                Arc::new(move |snapshot| {
                    chunk_inner.merge(&snapshot.documents);
                }),
            );
            match result {
                Ok(sub) => self
                    .chunk_subs
                    .lock()
                    .expect("roster lock poisoned")
                    .push(sub),
                Err(e) => {
                    warn!(error = %e, "failed to open chunk subscription");
                    self.degraded.store(true, Ordering::SeqCst);
                }
            }
        }
    }

    /// Fold one chunk snapshot into the merged view and deliver it.
    fn merge(&self, documents: &[beacon_store::Document]) {
        let members = self.members.lock().expect("roster lock poisoned").clone();

        let sorted = {
            let mut merged = self.merged.lock().expect("roster lock poisoned");
            for doc in documents {
                if let Some(status) = decode::friend_status(doc) {
                    merged.insert(status.phone.as_str().to_string(), status);
                }
            }
            // Chunk feeds race with membership changes; drop anything that
            // is no longer a member before delivering.
            merged.retain(|phone, _| members.contains(phone));

            let mut list: Vec<FriendStatus> = merged.values().cloned().collect();
            list.sort_by(FriendStatus::freshness_order);
            list
        };

        (self.on_change)(sorted);
    }
}

/// Handle owning one live friend-presence view. Cancelling (or dropping)
/// tears down the edge subscription and every chunk subscription.
pub struct RosterHandle {
    edge_sub: Option<Subscription>,
    inner: Arc<RosterInner>,
}

impl RosterHandle {
    /// Whether the last rebuild failed to open some chunk subscription.
    /// A degraded view keeps delivering, but members of the failed chunk
    /// never appear until a later membership change rebuilds cleanly.
    pub fn is_degraded(&self) -> bool {
        self.inner.degraded.load(Ordering::SeqCst)
    }

    /// Stop the feed; no deliveries happen after this returns.
    pub fn cancel(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(sub) = self.edge_sub.take() {
            sub.cancel();
        }
        let old_subs: Vec<Subscription> = {
            let mut subs = self.inner.chunk_subs.lock().expect("roster lock poisoned");
            subs.drain(..).collect()
        };
        for sub in old_subs {
            sub.cancel();
        }
    }
}

impl Drop for RosterHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}
