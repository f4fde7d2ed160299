//! Per-client advisory locks.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;

use clientvault_core::error::AppError;
use clientvault_core::result::AppResult;
use clientvault_core::types::id::ClientId;

type Registry = DashMap<ClientId, Arc<Mutex<()>>>;

/// Serializes mutating operations within one client's tree.
///
/// Different clients never contend. Acquisition gives up after `timeout`
/// with a `Conflict` so a stuck migration cannot pile up requests.
#[derive(Debug)]
pub struct ClientLocks {
    locks: Arc<Registry>,
    timeout: Duration,
}

/// Exclusive access to one client's tree until dropped.
///
/// Releasing the last interest in a client's lock removes its entry.
#[derive(Debug)]
pub struct ClientLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    client_id: ClientId,
    locks: Arc<Registry>,
}

impl Drop for ClientLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks
            .remove_if(&self.client_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl ClientLocks {
    /// Creates an empty registry.
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
            timeout,
        }
    }

    /// Number of clients with a held or awaited lock.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no client lock is held or awaited.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Waits for exclusive access to `client_id`'s tree.
    pub async fn acquire(&self, client_id: ClientId) -> AppResult<ClientLockGuard> {
        let lock = self
            .locks
            .entry(client_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        match tokio::time::timeout(self.timeout, lock.lock_owned()).await {
            Ok(guard) => Ok(ClientLockGuard {
                guard: Some(guard),
                client_id,
                locks: self.locks.clone(),
            }),
            Err(_) => {
                self.locks
                    .remove_if(&client_id, |_, lock| Arc::strong_count(lock) == 1);
                warn!(
                    client_id = %client_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Timed out waiting for workspace lock"
                );
                Err(AppError::conflict(
                    "Workspace is busy with another change; retry shortly",
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clientvault_core::error::ErrorKind;

    #[tokio::test(start_paused = true)]
    async fn test_same_client_waits_then_times_out() {
        let locks = ClientLocks::new(Duration::from_secs(1));
        let client = ClientId::new();
        let _held = locks.acquire(client).await.unwrap();

        let err = locks.acquire(client).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_clients_do_not_contend() {
        let locks = ClientLocks::new(Duration::from_secs(1));
        let _c1 = locks.acquire(ClientId::new()).await.unwrap();
        assert!(locks.acquire(ClientId::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_released_lock_can_be_reacquired() {
        let locks = ClientLocks::new(Duration::from_secs(1));
        let client = ClientId::new();
        drop(locks.acquire(client).await.unwrap());
        assert!(locks.acquire(client).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_released_locks_leave_no_entries() {
        let locks = ClientLocks::new(Duration::from_secs(1));
        let client = ClientId::new();

        let held = locks.acquire(client).await.unwrap();
        assert_eq!(locks.len(), 1);
        // A waiter that gives up does not remove the held entry.
        assert!(locks.acquire(client).await.is_err());
        assert_eq!(locks.len(), 1);

        drop(held);
        assert!(locks.is_empty());

        for _ in 0..3 {
            drop(locks.acquire(ClientId::new()).await.unwrap());
        }
        assert!(locks.is_empty());
    }
}
