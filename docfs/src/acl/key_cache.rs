use crate::acl::verifier::AccessVerifier;
use crate::errors::{Error, Result};
use crate::types::is_blank;
use arc_swap::ArcSwapOption;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Remembers the last API key the ACL service accepted.
///
/// There is one slot for the whole process, not one per key: two applications alternating
/// keys will each trigger a remote validation, and concurrent validations of different keys
/// race with the last successful one winning the slot. That is fine for a single trusted
/// caller. The slot is swapped atomically, so readers never see a torn value.
pub struct ApiKeyCache {
    verifier: AccessVerifier,
    slot: ArcSwapOption<String>,
}

impl ApiKeyCache {
    pub fn new(verifier: AccessVerifier) -> Self {
        Self {
            verifier,
            slot: ArcSwapOption::empty(),
        }
    }

    /// Succeeds if `api_key` is the cached key, or if the ACL service accepts it, in which case
    /// it becomes the cached key.
    ///
    /// A rejected key fails with `Unauthorized` and leaves the cache unchanged.
    #[instrument(skip_all)]
    pub async fn check_or_set(&self, api_key: &str) -> Result<()> {
        if is_blank(api_key) {
            return Err(Error::invalid_request("ApiKey must be set"));
        }

        if self.is_cached(api_key) {
            debug!("ApiKey matches the cached key");
            return Ok(());
        }

        let auth = self.verifier.validate_key(api_key).await?;
        if !auth.authorized {
            return Err(Error::Unauthorized {
                reason: "invalid ApiKey".to_string(),
            });
        }

        self.slot.store(Some(Arc::new(api_key.to_string())));
        info!("ApiKey validated and cached");
        Ok(())
    }

    /// Whether `api_key` is the key currently held in the slot
    pub fn is_cached(&self, api_key: &str) -> bool {
        self.slot.load().as_deref().is_some_and(|cached| cached == api_key)
    }
}
