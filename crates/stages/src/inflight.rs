//! Per-token in-flight markers.
//!
//! A resolve holds the marker for its token for the whole pipeline run. A
//! second resolve for the same token waits on the marker, then finds the
//! artifact the first run cached instead of compiling again.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use pipeline::ShareToken;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub(crate) struct InflightLocks {
    locks: Mutex<HashMap<ShareToken, Arc<AsyncMutex<()>>>>,
}

impl InflightLocks {
    /// Waits until no other resolve holds `token`, then takes the marker.
    pub(crate) async fn acquire(&self, token: &ShareToken) -> InflightGuard<'_> {
        let lock = Arc::clone(self.locks.lock().entry(token.clone()).or_default());
        let held = Arc::clone(&lock).lock_owned().await;
        InflightGuard {
            registry: self,
            token: token.clone(),
            lock,
            _held: held,
        }
    }

    /// Number of tokens with a resolve running or waiting.
    pub(crate) fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

pub(crate) struct InflightGuard<'a> {
    registry: &'a InflightLocks,
    token: ShareToken,
    lock: Arc<AsyncMutex<()>>,
    _held: OwnedMutexGuard<()>,
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        let mut locks = self.registry.locks.lock();
        // Clones are only taken under the map lock: the map, `lock`, and
        // `_held` account for three. Anything above that is a waiter.
        let idle = Arc::strong_count(&self.lock) <= 3;
        let current = locks
            .get(&self.token)
            .is_some_and(|l| Arc::ptr_eq(l, &self.lock));
        if idle && current {
            locks.remove(&self.token);
        }
    }
}
