//! Account lifecycle: cascading deletion of a user's relationship data,
//! then removal of the identity record at the external authenticator.

use std::sync::Arc;

use tracing::{info, warn};

use beacon_shared::constants::BATCH_WRITE_LIMIT;
use beacon_shared::PhoneNumber;
use beacon_store::{paths, DocumentStore, WriteBatch, WriteOp};

use crate::auth::IdentityProvider;
use crate::error::{ClientError, Result};

/// Orchestrates account deletion and sign-out.
pub struct AccountService {
    store: Arc<dyn DocumentStore>,
    auth: Arc<dyn IdentityProvider>,
}

impl AccountService {
    pub fn new(store: Arc<dyn DocumentStore>, auth: Arc<dyn IdentityProvider>) -> Self {
        Self { store, auth }
    }

    /// End the session at the authenticator.
    pub async fn sign_out(&self) -> Result<()> {
        self.auth.sign_out().await.map_err(ClientError::Auth)
    }

    /// Delete every record owned by `me`: both halves of every friend
    /// edge, the profile, and all incoming-request, outgoing-request, and
    /// block documents, committed in as few atomic batches as the store's
    /// write limit allows.
    ///
    /// On store failure the remaining batches are abandoned and the error
    /// reports how many batches had already committed; committed batches
    /// stay applied (there is no rollback across batches). After the data
    /// is gone the identity record is deleted at the authenticator and the
    /// session is signed out; an identity-deletion failure is surfaced as
    /// [`ClientError::IdentityNotDeleted`] without retrying, and sign-out
    /// is still attempted.
    ///
    /// Mirror records of requests this user appears in under *other*
    /// users' trees are outside `me`'s subtree and are left in place.
    pub async fn delete_account(&self, me: &PhoneNumber) -> Result<()> {
        let mut ops: Vec<WriteOp> = Vec::new();

        let edges = self.store.list(&paths::friends_of(me)).await?;
        for edge in &edges {
            ops.push(WriteOp::Delete {
                path: edge.path.clone(),
            });
            if let Ok(friend) = PhoneNumber::normalize(edge.id()) {
                ops.push(WriteOp::Delete {
                    path: paths::friend_edge(&friend, me),
                });
            }
        }

        ops.push(WriteOp::Delete {
            path: paths::profile(me),
        });

        for collection in [
            paths::incoming_requests_of(me),
            paths::outgoing_requests_of(me),
            paths::blocked_of(me),
        ] {
            for doc in self.store.list(&collection).await? {
                ops.push(WriteOp::Delete { path: doc.path });
            }
        }

        let total = ops.len().div_ceil(BATCH_WRITE_LIMIT);
        for (committed, chunk) in ops.chunks(BATCH_WRITE_LIMIT).enumerate() {
            if let Err(source) = self
                .store
                .commit(WriteBatch::from_ops(chunk.to_vec()))
                .await
            {
                warn!(phone = %me, committed, total, "account deletion aborted mid-cascade");
                return Err(ClientError::DeletionAborted {
                    committed,
                    total,
                    source,
                });
            }
        }
        info!(phone = %me, friends = edges.len(), batches = total, "account data deleted");

        if let Err(auth_err) = self.auth.delete_current_identity().await {
            warn!(phone = %me, error = %auth_err, "identity record not deleted");
            // Data is already gone; still end the session.
            if let Err(e) = self.auth.sign_out().await {
                warn!(error = %e, "sign-out after failed identity deletion also failed");
            }
            return Err(ClientError::IdentityNotDeleted(auth_err));
        }

        self.auth.sign_out().await.map_err(ClientError::Auth)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticIdentity;
    use beacon_shared::constants::{
        FIELD_ADDED_AT, FIELD_BLOCKED_AT, FIELD_CREATED_AT, FIELD_NAME, FIELD_STATUS,
        REQUEST_STATUS_PENDING,
    };
    use beacon_store::document::{fields, FieldValue};
    use beacon_store::MemoryStore;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    fn phone(s: &str) -> PhoneNumber {
        PhoneNumber::normalize(s).unwrap()
    }

    fn numbered(i: usize) -> PhoneNumber {
        phone(&format!("+1777000{i:04}"))
    }

    async fn seed_user(
        store: &MemoryStore,
        me: &PhoneNumber,
        friends: usize,
        incoming: usize,
        outgoing: usize,
        blocked: usize,
    ) {
        store
            .set_merge(
                &paths::profile(me),
                fields([(FIELD_NAME, FieldValue::string("Ada"))]),
            )
            .await
            .unwrap();
        for i in 0..friends {
            let f = numbered(i);
            for (a, b) in [(me, &f), (&f, me)] {
                store
                    .set_merge(
                        &paths::friend_edge(a, b),
                        fields([(FIELD_ADDED_AT, FieldValue::ServerTimestamp)]),
                    )
                    .await
                    .unwrap();
            }
        }
        for i in 0..incoming {
            store
                .set_merge(
                    &paths::incoming_request(me, &numbered(1000 + i)),
                    fields([(FIELD_STATUS, FieldValue::string(REQUEST_STATUS_PENDING))]),
                )
                .await
                .unwrap();
        }
        for i in 0..outgoing {
            store
                .set_merge(
                    &paths::outgoing_request(me, &numbered(2000 + i)),
                    fields([
                        (FIELD_STATUS, FieldValue::string(REQUEST_STATUS_PENDING)),
                        (FIELD_CREATED_AT, FieldValue::ServerTimestamp),
                    ]),
                )
                .await
                .unwrap();
        }
        for i in 0..blocked {
            store
                .set_merge(
                    &paths::block_record(me, &numbered(3000 + i)),
                    fields([(FIELD_BLOCKED_AT, FieldValue::ServerTimestamp)]),
                )
                .await
                .unwrap();
        }
    }

    fn service(store: &MemoryStore, auth: Arc<StaticIdentity>) -> AccountService {
        AccountService::new(Arc::new(store.clone()), auth)
    }

    #[tokio::test]
    async fn cascade_removes_everything_and_signs_out() {
        init_tracing();
        let store = MemoryStore::new();
        let me = phone("+15550000001");
        seed_user(&store, &me, 3, 2, 2, 1).await;
        // profile + 3 own edge halves + 3 mirror halves + 2 + 2 + 1.
        assert_eq!(store.doc_count(), 12);

        let auth = Arc::new(StaticIdentity::signed_in(me.clone()));
        service(&store, Arc::clone(&auth))
            .delete_account(&me)
            .await
            .unwrap();

        assert_eq!(store.doc_count(), 0, "both edge halves and all own docs gone");
        assert!(auth.current_identity().is_none(), "signed out");
    }

    #[tokio::test]
    async fn cascade_spans_multiple_batches() {
        let store = MemoryStore::new();
        let me = phone("+15550000001");
        // 300 friends -> 600 edge deletes + profile = 601 ops = 2 batches.
        seed_user(&store, &me, 300, 0, 0, 0).await;

        let auth = Arc::new(StaticIdentity::signed_in(me.clone()));
        service(&store, auth).delete_account(&me).await.unwrap();
        assert_eq!(store.doc_count(), 0);
    }

    #[tokio::test]
    async fn mid_cascade_failure_keeps_only_committed_batches() {
        let store = MemoryStore::new();
        let me = phone("+15550000001");
        // 300 friends -> 600 edge deletes + profile = 601 ops = 2 batches.
        seed_user(&store, &me, 300, 0, 0, 0).await;
        assert_eq!(store.doc_count(), 601);

        store.fail_after_commits(1);
        let auth = Arc::new(StaticIdentity::signed_in(me.clone()));
        let err = service(&store, Arc::clone(&auth))
            .delete_account(&me)
            .await
            .unwrap_err();
        match err {
            ClientError::DeletionAborted {
                committed, total, ..
            } => {
                assert_eq!(committed, 1);
                assert_eq!(total, 2);
            }
            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(
            store.doc_count(),
            101,
            "first batch stays applied, later ops untouched"
        );
        assert!(
            auth.current_identity().is_some(),
            "identity deletion never reached"
        );
    }

    #[tokio::test]
    async fn unreachable_store_aborts_before_any_commit() {
        let store = MemoryStore::new();
        let me = phone("+15550000001");
        seed_user(&store, &me, 2, 1, 1, 0).await;
        let before = store.doc_count();

        store.set_unavailable(true);
        let auth = Arc::new(StaticIdentity::signed_in(me.clone()));
        let err = service(&store, Arc::clone(&auth))
            .delete_account(&me)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Store(_)));

        store.set_unavailable(false);
        assert_eq!(store.doc_count(), before, "nothing was committed");
        assert!(auth.current_identity().is_some(), "session untouched");
    }

    #[tokio::test]
    async fn identity_failure_surfaced_but_data_gone_and_signed_out() {
        let store = MemoryStore::new();
        let me = phone("+15550000001");
        seed_user(&store, &me, 1, 0, 0, 0).await;

        let auth = Arc::new(StaticIdentity::signed_in(me.clone()));
        auth.set_fail_deletion(true);

        let err = service(&store, Arc::clone(&auth))
            .delete_account(&me)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::IdentityNotDeleted(_)));
        assert_eq!(store.doc_count(), 0, "relationship data deleted regardless");
        assert!(
            auth.current_identity().is_none(),
            "sign-out still attempted after identity failure"
        );
    }
}
