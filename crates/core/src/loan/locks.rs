//! In-process per-loan serialization.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use kopa_shared::types::LoanId;

type LockMap = Arc<DashMap<LoanId, Arc<Mutex<()>>>>;

/// Registry of one async mutex per loan.
///
/// Writers to the same loan queue behind each other; writers to different
/// loans never contend. The database row lock covers other processes.
/// An entry lives only while some task holds or waits for it.
#[derive(Debug, Default)]
pub struct LoanLocks {
    locks: LockMap,
}

/// Exclusive access to one loan. Releasing it drops the registry entry
/// once no other task is queued on the same loan.
#[derive(Debug)]
pub struct LoanGuard {
    id: LoanId,
    locks: LockMap,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for LoanGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Checked under the shard lock, so no clone can be handed out meanwhile.
        self.locks
            .remove_if(&self.id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl LoanLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`. Access ends when the guard drops.
    pub async fn acquire(&self, id: LoanId) -> LoanGuard {
        // Clone the Arc out so the shard lock is released before awaiting.
        let lock = self.locks.entry(id).or_default().clone();
        let guard = lock.lock_owned().await;
        LoanGuard {
            id,
            locks: Arc::clone(&self.locks),
            guard: Some(guard),
        }
    }

    /// Number of loans with a registered lock.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Returns true if no lock is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
