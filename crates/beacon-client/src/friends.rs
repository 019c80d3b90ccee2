//! The friend-relationship state machine.
//!
//! Per ordered pair (requester, target) the states are `None`, `Pending`,
//! `Friends`, and `Blocked`. Every transition that touches both sides of a
//! relationship goes through one atomic batch, so no reader ever observes
//! a one-sided edge or a half-resolved request.

use std::sync::Arc;

use tracing::{debug, info};

use beacon_shared::constants::{
    FALLBACK_NAME, FIELD_ADDED_AT, FIELD_BLOCKED_AT, FIELD_BLOCKED_BY, FIELD_CREATED_AT,
    FIELD_NAME, FIELD_STATUS, OUTGOING_REQUEST_PLACEHOLDER, REQUEST_STATUS_PENDING,
    UNKNOWN_REQUESTER_NAME,
};
use beacon_shared::{FriendRequestEntry, PhoneNumber, RelationState, ValidationError};
use beacon_store::document::{fields, FieldValue};
use beacon_store::{decode, paths, DocumentStore, Query, Subscription, WriteBatch};

use crate::error::Result;

/// Owns the friend-request lifecycle and the symmetric edge set.
pub struct FriendService {
    store: Arc<dyn DocumentStore>,
}

impl FriendService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Send a friend request to `raw_target` (raw user input; normalized
    /// and validated here).
    ///
    /// Idempotent: re-sending while a request is already pending succeeds
    /// without rewriting anything. The existence check and the batch write
    /// are not one transaction, so two near-simultaneous requests in
    /// opposite directions can both commit; the resulting symmetric
    /// pending pair resolves itself as soon as either side accepts.
    pub async fn send_friend_request(&self, me: &PhoneNumber, raw_target: &str) -> Result<()> {
        let target = PhoneNumber::normalize(raw_target)?;
        if &target == me {
            return Err(ValidationError::SelfRequest.into());
        }

        let my_name = match self.store.get(&paths::profile(me)).await? {
            Some(doc) => decode::name_or(&doc, FALLBACK_NAME),
            None => FALLBACK_NAME.to_string(),
        };

        let incoming = paths::incoming_request(&target, me);
        if self.store.get(&incoming).await?.is_some() {
            debug!(from = %me, to = %target, "request already pending, nothing to do");
            return Ok(());
        }

        let batch = WriteBatch::new()
            .set_merge(
                incoming,
                fields([
                    (FIELD_STATUS, FieldValue::string(REQUEST_STATUS_PENDING)),
                    (FIELD_NAME, FieldValue::string(my_name)),
                    (FIELD_CREATED_AT, FieldValue::ServerTimestamp),
                ]),
            )
            .set_merge(
                paths::outgoing_request(me, &target),
                fields([
                    (FIELD_STATUS, FieldValue::string(REQUEST_STATUS_PENDING)),
                    (FIELD_NAME, FieldValue::string(OUTGOING_REQUEST_PLACEHOLDER)),
                    (FIELD_CREATED_AT, FieldValue::ServerTimestamp),
                ]),
            );
        self.store.commit(batch).await?;
        info!(from = %me, to = %target, "friend request sent");
        Ok(())
    }

    /// Accept a pending request from `requester`: one batch creates both
    /// edge halves and deletes both mirror records.
    ///
    /// Succeeds as a no-op when the request has already been resolved.
    pub async fn accept(&self, me: &PhoneNumber, requester: &PhoneNumber) -> Result<()> {
        let incoming = paths::incoming_request(me, requester);
        if self.store.get(&incoming).await?.is_none() {
            debug!(me = %me, requester = %requester, "request already resolved");
            return Ok(());
        }

        let batch = WriteBatch::new()
            .set_merge(
                paths::friend_edge(me, requester),
                fields([(FIELD_ADDED_AT, FieldValue::ServerTimestamp)]),
            )
            .set_merge(
                paths::friend_edge(requester, me),
                fields([(FIELD_ADDED_AT, FieldValue::ServerTimestamp)]),
            )
            .delete(incoming)
            .delete(paths::outgoing_request(requester, me));
        self.store.commit(batch).await?;
        info!(me = %me, requester = %requester, "friend request accepted");
        Ok(())
    }

    /// Decline a pending request from `requester`: both mirror records are
    /// deleted in one batch. Absent records delete as a no-op.
    pub async fn decline(&self, me: &PhoneNumber, requester: &PhoneNumber) -> Result<()> {
        let batch = WriteBatch::new()
            .delete(paths::incoming_request(me, requester))
            .delete(paths::outgoing_request(requester, me));
        self.store.commit(batch).await?;
        info!(me = %me, requester = %requester, "friend request declined");
        Ok(())
    }

    /// Remove a confirmed friend: both edge halves go in one batch.
    pub async fn remove_friend(&self, me: &PhoneNumber, friend: &PhoneNumber) -> Result<()> {
        let batch = WriteBatch::new()
            .delete(paths::friend_edge(me, friend))
            .delete(paths::friend_edge(friend, me));
        self.store.commit(batch).await?;
        info!(me = %me, friend = %friend, "friend removed");
        Ok(())
    }

    /// Block `other`: one batch creates the block record and deletes any
    /// pending request in either direction plus both edge halves.
    ///
    /// Blocking does not stop the blocked identity from sending a new
    /// request later; whether it should is an open product decision.
    pub async fn block(&self, me: &PhoneNumber, other: &PhoneNumber) -> Result<()> {
        let batch = WriteBatch::new()
            .set_merge(
                paths::block_record(me, other),
                fields([
                    (FIELD_BLOCKED_AT, FieldValue::ServerTimestamp),
                    (FIELD_BLOCKED_BY, FieldValue::string(me.as_str())),
                ]),
            )
            .delete(paths::incoming_request(me, other))
            .delete(paths::outgoing_request(other, me))
            .delete(paths::incoming_request(other, me))
            .delete(paths::outgoing_request(me, other))
            .delete(paths::friend_edge(me, other))
            .delete(paths::friend_edge(other, me));
        self.store.commit(batch).await?;
        info!(me = %me, other = %other, "user blocked");
        Ok(())
    }

    /// Classify the current relationship between `a` and `b` from point
    /// reads: `Blocked` wins over `Friends` wins over `Pending`.
    pub async fn relationship_between(
        &self,
        a: &PhoneNumber,
        b: &PhoneNumber,
    ) -> Result<RelationState> {
        if self.store.get(&paths::block_record(a, b)).await?.is_some()
            || self.store.get(&paths::block_record(b, a)).await?.is_some()
        {
            return Ok(RelationState::Blocked);
        }
        if self.store.get(&paths::friend_edge(a, b)).await?.is_some() {
            return Ok(RelationState::Friends);
        }
        if self.store.get(&paths::incoming_request(b, a)).await?.is_some()
            || self.store.get(&paths::incoming_request(a, b)).await?.is_some()
        {
            return Ok(RelationState::Pending);
        }
        Ok(RelationState::None)
    }

    /// Live feed of `me`'s pending incoming requests, newest first.
    pub fn subscribe_incoming_requests(
        &self,
        me: &PhoneNumber,
        on_change: impl Fn(Vec<FriendRequestEntry>) + Send + Sync + 'static,
    ) -> Result<Subscription> {
        self.subscribe_requests(
            Query::Collection(paths::incoming_requests_of(me)),
            UNKNOWN_REQUESTER_NAME,
            on_change,
        )
    }

    /// Live feed of `me`'s pending outgoing requests, newest first.
    pub fn subscribe_outgoing_requests(
        &self,
        me: &PhoneNumber,
        on_change: impl Fn(Vec<FriendRequestEntry>) + Send + Sync + 'static,
    ) -> Result<Subscription> {
        self.subscribe_requests(
            Query::Collection(paths::outgoing_requests_of(me)),
            OUTGOING_REQUEST_PLACEHOLDER,
            on_change,
        )
    }

    fn subscribe_requests(
        &self,
        query: Query,
        name_fallback: &'static str,
        on_change: impl Fn(Vec<FriendRequestEntry>) + Send + Sync + 'static,
    ) -> Result<Subscription> {
        let sub = self.store.subscribe(
            query,
            Arc::new(move |snapshot| {
                let mut requests: Vec<FriendRequestEntry> = snapshot
                    .documents
                    .iter()
                    .filter_map(|doc| decode::friend_request(doc, name_fallback))
                    .collect();
                requests.sort_by(FriendRequestEntry::newest_first);
                on_change(requests);
            }),
        )?;
        Ok(sub)
    }
}
