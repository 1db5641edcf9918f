//! Per-user serialisation of token refreshes.
//!
//! Google rotates refresh tokens on some grants; two concurrent refreshes for
//! the same user can leave one of them holding an already-invalidated token.
//! Callers running several managers for one user take the user's lock around
//! [`TokenManager::ensure_token_fresh`](crate::TokenManager::ensure_token_fresh).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of one async mutex per user key.
#[derive(Debug, Default, Clone)]
pub struct RefreshLocks {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl RefreshLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and takes the lock of `user`. Released when the guard drops.
    pub async fn lock(&self, user: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop entries nobody holds or waits on.
            locks.retain(|_, l| Arc::strong_count(l) > 1);
            Arc::clone(locks.entry(user.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of users with a held or awaited lock.
    #[must_use]
    pub fn active(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|l| Arc::strong_count(l) > 1)
            .count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_user_is_serialised() {
        let locks = RefreshLocks::new();
        let guard = locks.lock("alice").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock("alice").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_users_do_not_block() {
        let locks = RefreshLocks::new();
        let _alice = locks.lock("alice").await;
        let bob = tokio::time::timeout(Duration::from_secs(1), locks.lock("bob")).await;
        assert!(bob.is_ok());
        assert_eq!(locks.active(), 2);
    }

    #[tokio::test]
    async fn test_released_entries_are_pruned() {
        let locks = RefreshLocks::new();
        drop(locks.lock("alice").await);
        assert_eq!(locks.active(), 0);
        let _bob = locks.lock("bob").await;
        assert_eq!(locks.locks.lock().unwrap().len(), 1);
    }
}
