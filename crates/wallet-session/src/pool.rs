//! Registry of live wallet tool processes.
//!
//! The pool maps each [`WalletIdentity`] to at most one live
//! [`ProcessHandle`]. Handles are spawned on first use and removed as soon
//! as their process exits, so a crashed process is never handed out again.
//! Pools are ordinary values: create one per service, or one per test.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::debug;

use crate::error::SessionError;
use crate::identity::WalletIdentity;
use crate::settings::SessionSettings;
use crate::supervisor::ProcessHandle;

const POOL_TARGET: &str = "wallet_session::pool";

type Handles = HashMap<WalletIdentity, Arc<ProcessHandle>>;

/// Pooled wallet tool processes keyed by identity.
///
/// Cloning is cheap and yields a view of the same pool.
#[derive(Debug, Clone)]
pub struct ProcessPool {
    inner: Arc<PoolInner>,
}

#[derive(Debug)]
struct PoolInner {
    settings: SessionSettings,
    handles: Mutex<Handles>,
}

impl PoolInner {
    fn lock(&self) -> MutexGuard<'_, Handles> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes the entry for `identity` only if it still belongs to handle `id`.
    fn deregister(&self, identity: &WalletIdentity, id: u64) {
        let removed = {
            let mut handles = self.lock();
            match handles.get(identity) {
                Some(current) if current.id() == id => handles.remove(identity),
                _ => None,
            }
        };
        if removed.is_some() {
            debug!(
                target: POOL_TARGET,
                identity = %identity,
                handle = id,
                "removed exited process from pool"
            );
        }
    }
}

impl ProcessPool {
    /// Creates an empty pool spawning processes with `settings`.
    #[must_use]
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                settings,
                handles: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Settings used for every spawned process.
    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.inner.settings
    }

    /// Returns the live handle for `identity`, spawning one if needed.
    ///
    /// Concurrent callers for the same identity receive the same handle;
    /// spawning happens under the pool lock so only one process is started.
    /// A failed spawn is not retried.
    ///
    /// # Errors
    ///
    /// Returns the spawn error from [`ProcessHandle::spawn`].
    pub fn acquire(&self, identity: &WalletIdentity) -> Result<Arc<ProcessHandle>, SessionError> {
        let handle = {
            let mut handles = self.inner.lock();
            if let Some(existing) = handles.get(identity) {
                if !existing.is_exited() {
                    return Ok(Arc::clone(existing));
                }
                handles.remove(identity);
            }

            let spawned = Arc::new(ProcessHandle::spawn(
                identity.clone(),
                &self.inner.settings,
            )?);
            handles.insert(identity.clone(), Arc::clone(&spawned));
            spawned
        };

        let pool: Weak<PoolInner> = Arc::downgrade(&self.inner);
        let key = identity.clone();
        let id = handle.id();
        handle.on_exit(move || {
            if let Some(inner) = pool.upgrade() {
                inner.deregister(&key, id);
            }
        });

        debug!(
            target: POOL_TARGET,
            identity = %identity,
            handle = id,
            "registered new process"
        );
        Ok(handle)
    }

    /// Removes and destroys the handle for `identity`, if any.
    ///
    /// Call before deleting the identity's data directory so no process
    /// keeps files open in it. Returns whether a handle was removed.
    pub fn evict(&self, identity: &WalletIdentity) -> bool {
        let removed = self.inner.lock().remove(identity);
        let Some(handle) = removed else {
            return false;
        };
        debug!(
            target: POOL_TARGET,
            identity = %identity,
            handle = handle.id(),
            "evicting process"
        );
        handle.destroy();
        true
    }

    /// Whether a handle is registered for `identity`.
    #[must_use]
    pub fn contains(&self, identity: &WalletIdentity) -> bool {
        self.inner.lock().contains_key(identity)
    }

    /// Number of registered handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether no handles are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
