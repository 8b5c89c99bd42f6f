//! Per-session serialization of turns.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::foundation::SessionId;

/// Registry of one async mutex per session id.
///
/// Turns and summary requests for the same session run one at a time; other
/// sessions are never blocked. Entries nobody holds or waits on are pruned.
#[derive(Debug, Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `id`. Access ends when the guard drops.
    pub async fn acquire(&self, id: &SessionId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
            // The map's own reference is the only one left for idle entries.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(id.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of sessions currently tracked.
    pub fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sid(value: &str) -> SessionId {
        SessionId::new(value).unwrap()
    }

    #[tokio::test]
    async fn same_session_waits() {
        let locks = Arc::new(SessionLocks::new());
        let guard = locks.acquire(&sid("a")).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move { locks.acquire(&sid("a")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_sessions_do_not_block() {
        let locks = SessionLocks::new();
        let _a = locks.acquire(&sid("a")).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire(&sid("b"))).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn idle_entries_are_pruned() {
        let locks = SessionLocks::new();
        drop(locks.acquire(&sid("a")).await);
        drop(locks.acquire(&sid("b")).await);
        let _c = locks.acquire(&sid("c")).await;
        assert_eq!(locks.tracked(), 1);
    }
}
