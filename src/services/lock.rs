use {
    std::collections::HashMap,
    std::sync::Arc,
    tokio::sync::{Mutex, OwnedMutexGuard},
};

/// Per-key mutual exclusion. Reconciliation for one gateway payment id
/// must never interleave: the duplicate-notification guard is a
/// read-then-write sequence with no row lock underneath it. Distinct
/// keys proceed fully in parallel.
#[derive(Default)]
pub struct KeyedLock {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let entry = {
            let mut map = self.inner.lock().await;
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        entry.lock_owned().await
    }

    /// Drop entries nobody is waiting on. Called opportunistically; the
    /// map otherwise grows one entry per distinct payment id.
    pub async fn sweep(&self) {
        let mut map = self.inner.lock().await;
        map.retain(|_, m| Arc::strong_count(m) > 1);
    }
}
