//! Own-presence reads, writes, and the live own-status feed.

use std::sync::Arc;

use tracing::{debug, info};

use beacon_shared::constants::{FALLBACK_NAME, FIELD_AVAILABLE, FIELD_LAST_CHANGED, FIELD_NAME};
use beacon_shared::{PhoneNumber, Profile};
use beacon_store::document::{fields, FieldValue};
use beacon_store::{decode, paths, DocumentStore, Query, Subscription};

use crate::error::Result;

/// Reads and writes a single user's availability flag and profile.
pub struct PresenceService {
    store: Arc<dyn DocumentStore>,
}

impl PresenceService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create the profile on first sign-in if it does not exist yet, with
    /// the given name and `available = true`.
    ///
    /// Returns `true` when a profile was created.
    pub async fn ensure_profile(&self, phone: &PhoneNumber, name: &str) -> Result<bool> {
        let path = paths::profile(phone);
        if self.store.get(&path).await?.is_some() {
            return Ok(false);
        }

        self.store
            .set_merge(
                &path,
                fields([
                    (FIELD_NAME, FieldValue::string(name)),
                    (FIELD_AVAILABLE, FieldValue::boolean(true)),
                    (FIELD_LAST_CHANGED, FieldValue::ServerTimestamp),
                ]),
            )
            .await?;
        info!(phone = %phone, "created user profile");
        Ok(true)
    }

    /// Merge a display-name change without clobbering the status fields.
    pub async fn save_profile(&self, phone: &PhoneNumber, name: &str) -> Result<()> {
        self.store
            .set_merge(
                &paths::profile(phone),
                fields([(FIELD_NAME, FieldValue::string(name))]),
            )
            .await?;
        Ok(())
    }

    /// Read the full profile, if one exists.
    pub async fn load_profile(&self, phone: &PhoneNumber) -> Result<Option<Profile>> {
        let doc = self.store.get(&paths::profile(phone)).await?;
        Ok(doc.as_ref().and_then(decode::profile))
    }

    /// Current availability; a missing profile or field reads as `false`.
    pub async fn load_status(&self, phone: &PhoneNumber) -> Result<bool> {
        let doc = self.store.get(&paths::profile(phone)).await?;
        Ok(doc.map(|d| d.bool_or(FIELD_AVAILABLE, false)).unwrap_or(false))
    }

    /// Merge the availability flag and bump the freshness timestamp.
    pub async fn update_status(&self, phone: &PhoneNumber, available: bool) -> Result<()> {
        self.store
            .set_merge(
                &paths::profile(phone),
                fields([
                    (FIELD_AVAILABLE, FieldValue::boolean(available)),
                    (FIELD_LAST_CHANGED, FieldValue::ServerTimestamp),
                ]),
            )
            .await?;
        debug!(phone = %phone, available, "updated own status");
        Ok(())
    }

    /// Live feed of the user's own availability. Snapshots for a missing
    /// profile are skipped. The caller must cancel the subscription when
    /// the owning scope ends.
    pub fn subscribe_status(
        &self,
        phone: &PhoneNumber,
        on_change: impl Fn(bool) + Send + Sync + 'static,
    ) -> Result<Subscription> {
        let sub = self.store.subscribe(
            Query::Doc(paths::profile(phone)),
            Arc::new(move |snapshot| {
                if let Some(doc) = snapshot.documents.first() {
                    on_change(doc.bool_or(FIELD_AVAILABLE, false));
                }
            }),
        )?;
        Ok(sub)
    }

    /// Display name with the `"Friend"` fallback for a missing profile or
    /// a blank name.
    pub async fn fetch_name(&self, phone: &PhoneNumber) -> Result<String> {
        let doc = self.store.get(&paths::profile(phone)).await?;
        Ok(doc
            .map(|d| decode::name_or(&d, FALLBACK_NAME))
            .unwrap_or_else(|| FALLBACK_NAME.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn phone(s: &str) -> PhoneNumber {
        PhoneNumber::normalize(s).unwrap()
    }

    fn service() -> (PresenceService, MemoryStore) {
        let store = MemoryStore::new();
        (PresenceService::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn ensure_profile_creates_once() {
        let (svc, _store) = service();
        let me = phone("+15550000001");

        assert!(svc.ensure_profile(&me, "Ada").await.unwrap());
        assert!(!svc.ensure_profile(&me, "Someone else").await.unwrap());

        assert_eq!(svc.fetch_name(&me).await.unwrap(), "Ada");
        assert!(svc.load_status(&me).await.unwrap(), "new profiles start available");
    }

    #[tokio::test]
    async fn load_profile_round_trip() {
        let (svc, _store) = service();
        let me = phone("+15550000001");
        assert!(svc.load_profile(&me).await.unwrap().is_none());

        svc.ensure_profile(&me, "Ada").await.unwrap();
        let profile = svc.load_profile(&me).await.unwrap().unwrap();
        assert_eq!(profile.phone, me);
        assert_eq!(profile.name, "Ada");
        assert!(profile.available);
        assert!(profile.last_changed.is_some());
    }

    #[tokio::test]
    async fn missing_status_reads_false() {
        let (svc, _store) = service();
        assert!(!svc.load_status(&phone("+15550000009")).await.unwrap());
    }

    #[tokio::test]
    async fn update_status_preserves_name() {
        let (svc, _store) = service();
        let me = phone("+15550000001");
        svc.ensure_profile(&me, "Ada").await.unwrap();

        svc.update_status(&me, false).await.unwrap();
        assert!(!svc.load_status(&me).await.unwrap());
        assert_eq!(svc.fetch_name(&me).await.unwrap(), "Ada");
    }

    #[tokio::test]
    async fn fetch_name_falls_back() {
        let (svc, _store) = service();
        let me = phone("+15550000001");
        assert_eq!(svc.fetch_name(&me).await.unwrap(), "Friend");

        svc.ensure_profile(&me, "   ").await.unwrap();
        assert_eq!(svc.fetch_name(&me).await.unwrap(), "Friend");
    }

    #[tokio::test]
    async fn subscribe_status_delivers_changes() {
        let (svc, _store) = service();
        let me = phone("+15550000001");
        svc.ensure_profile(&me, "Ada").await.unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(Mutex::new(None));
        let sub = {
            let calls = Arc::clone(&calls);
            let last = Arc::clone(&last);
            svc.subscribe_status(&me, move |available| {
                calls.fetch_add(1, Ordering::SeqCst);
                *last.lock().unwrap() = Some(available);
            })
            .unwrap()
        };
        assert_eq!(calls.load(Ordering::SeqCst), 1, "initial snapshot");
        assert_eq!(*last.lock().unwrap(), Some(true));

        svc.update_status(&me, false).await.unwrap();
        assert_eq!(*last.lock().unwrap(), Some(false));

        sub.cancel();
        svc.update_status(&me, true).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn write_failure_surfaces() {
        let (svc, store) = service();
        let me = phone("+15550000001");
        store.set_unavailable(true);
        assert!(svc.update_status(&me, true).await.is_err());
    }
}
