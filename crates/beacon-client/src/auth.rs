//! Identity adapter over the external phone-number authenticator.
//!
//! The verification flow itself (SMS code exchange) is the vendor's
//! problem; the services only need the verified identity, sign-out, and
//! identity-record deletion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use beacon_shared::PhoneNumber;

/// The external authenticator, as seen by the services.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The currently signed-in, verified identity, if any.
    fn current_identity(&self) -> Option<PhoneNumber>;

    /// End the session.
    async fn sign_out(&self) -> anyhow::Result<()>;

    /// Delete the identity record at the authenticator. Does not touch
    /// any application data.
    async fn delete_current_identity(&self) -> anyhow::Result<()>;
}

/// A fixed-identity provider for tests and embedded use.
pub struct StaticIdentity {
    identity: Mutex<Option<PhoneNumber>>,
    fail_deletion: AtomicBool,
}

impl StaticIdentity {
    pub fn signed_in(phone: PhoneNumber) -> Self {
        Self {
            identity: Mutex::new(Some(phone)),
            fail_deletion: AtomicBool::new(false),
        }
    }

    /// Make `delete_current_identity` fail (test helper).
    pub fn set_fail_deletion(&self, fail: bool) {
        self.fail_deletion.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    fn current_identity(&self) -> Option<PhoneNumber> {
        self.identity.lock().expect("identity lock poisoned").clone()
    }

    async fn sign_out(&self) -> anyhow::Result<()> {
        self.identity.lock().expect("identity lock poisoned").take();
        Ok(())
    }

    async fn delete_current_identity(&self) -> anyhow::Result<()> {
        if self.fail_deletion.load(Ordering::SeqCst) {
            anyhow::bail!("identity backend rejected the deletion");
        }
        self.identity.lock().expect("identity lock poisoned").take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_out_clears_identity() {
        let auth = StaticIdentity::signed_in(PhoneNumber::normalize("+15550000001").unwrap());
        assert!(auth.current_identity().is_some());
        auth.sign_out().await.unwrap();
        assert!(auth.current_identity().is_none());
    }

    #[tokio::test]
    async fn failing_deletion_keeps_identity() {
        let auth = StaticIdentity::signed_in(PhoneNumber::normalize("+15550000001").unwrap());
        auth.set_fail_deletion(true);
        assert!(auth.delete_current_identity().await.is_err());
        assert!(auth.current_identity().is_some());
    }
}
