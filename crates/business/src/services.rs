//! Service context
//!
//! Shared state handed to every service: database pool, configuration and
//! the per-parent allocation locks.

use quickcreate_core::QuickCreateConfig;
use quickcreate_persistence::Database;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Context for business operations - contains database access
#[derive(Clone)]
pub struct ServiceContext {
    pool: SqlitePool,
    config: Arc<QuickCreateConfig>,
    locks: Arc<KeyedLocks>,
}

impl ServiceContext {
    /// Create new service context from database
    pub fn new(db: &Database, config: QuickCreateConfig) -> Self {
        Self::from_parts(db.pool().clone(), config)
    }

    /// Create from pool directly
    pub fn from_parts(pool: SqlitePool, config: QuickCreateConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            locks: Arc::new(KeyedLocks::default()),
        }
    }

    /// Get database pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &QuickCreateConfig {
        &self.config
    }

    /// Allocation locks, shared by every clone of this context
    pub fn locks(&self) -> &KeyedLocks {
        &self.locks
    }
}

/// One async mutex per key, created on first use.
///
/// Serializes work on the same key (e.g. one parent account in one exercise)
/// while letting different keys proceed in parallel. Entries nobody holds any
/// more are dropped on the next call.
#[derive(Default)]
pub struct KeyedLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    /// Lock for `key`. Hold the guard of the returned mutex for the critical
    /// section.
    pub fn lock_for(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        // Clones are only handed out under the map lock, so a count of one
        // means no caller holds or waits on that mutex.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(key.to_string()).or_default().clone()
    }

    /// Number of keys currently tracked
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_key_same_lock() {
        let locks = KeyedLocks::default();
        assert!(locks.is_empty());

        let a = locks.lock_for("2026:629");
        let b = locks.lock_for("2026:629");
        let c = locks.lock_for("2026:570");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn test_released_keys_are_evicted() {
        let locks = KeyedLocks::default();

        let first = locks.lock_for("2026:629");
        drop(first);
        let held = locks.lock_for("2026:570");
        // "2026:629" had no holder left
        assert_eq!(locks.len(), 1);

        let again = locks.lock_for("2026:570");
        assert!(Arc::ptr_eq(&held, &again));
        assert_eq!(locks.len(), 1);

        drop(held);
        drop(again);
        let _other = locks.lock_for("2025:430");
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn test_lock_excludes_second_holder() {
        let locks = KeyedLocks::default();
        let lock = locks.lock_for("2026:629");

        let guard = lock.lock().await;
        assert!(locks.lock_for("2026:629").try_lock().is_err());
        drop(guard);
        assert!(locks.lock_for("2026:629").try_lock().is_ok());
    }

    #[tokio::test]
    async fn test_context_clones_share_locks() {
        let pool = quickcreate_persistence::init_memory_database().await.unwrap();
        let ctx = ServiceContext::from_parts(pool, QuickCreateConfig::default());
        let clone = ctx.clone();

        let a = ctx.locks().lock_for("k");
        let b = clone.locks().lock_for("k");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(clone.config().search_limit, 20);
    }
}
