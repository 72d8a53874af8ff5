use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

/// Per-namespace-instance mutual exclusion for publish and rollback. The
/// registry itself is guarded by a short-lived parking_lot mutex; the returned
/// async mutex is held across snapshot + persist for one instance only, so
/// operations on different instances proceed independently.
#[derive(Debug, Default)]
pub struct NamespaceLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl NamespaceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_for(&self, key: &str) -> Arc<AsyncMutex<()>> {
        self.inner
            .lock()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_key_returns_same_lock() {
        let locks = NamespaceLocks::new();
        let a = locks.lock_for("demo+DEV+default+application");
        let b = locks.lock_for("demo+DEV+default+application");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn different_keys_do_not_contend() {
        let locks = NamespaceLocks::new();
        let a = locks.lock_for("demo+DEV+default+application");
        let b = locks.lock_for("demo+DEV+eu-west+application");

        let _held = a.lock().await;
        // Would deadlock if both keys shared a lock.
        let _other = b.lock().await;
    }
}
