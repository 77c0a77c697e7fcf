use alloy_primitives::Address;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

type LockMap = Arc<DashMap<Address, Arc<Mutex<()>>>>;

/// One async mutex per signer address. Requests from the same sender run one at a time;
/// different senders never wait on each other.
#[derive(Debug, Clone, Default)]
pub struct SenderLocks {
    locks: LockMap,
}

/// Exclusive hold on one sender. Dropping it releases the sender and forgets its entry
/// once nobody else is queued on it.
#[derive(Debug)]
pub struct SenderGuard {
    sender: Address,
    guard: Option<OwnedMutexGuard<()>>,
    locks: LockMap,
}

impl Drop for SenderGuard {
    fn drop(&mut self) {
        // the guard itself holds a reference to the mutex, release it first
        self.guard.take();
        self.locks.remove_if(&self.sender, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl SenderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Held until the guard drops
    pub async fn acquire(&self, sender: Address) -> SenderGuard {
        let lock = self.locks.entry(sender).or_default().clone();
        if lock.try_lock().is_err() {
            debug!("Waiting for in-flight swap of {}", sender);
        }
        let guard = lock.lock_owned().await;
        SenderGuard { sender, guard: Some(guard), locks: self.locks.clone() }
    }

    /// Senders currently holding or waiting on a lock
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
