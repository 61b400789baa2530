use std::sync::Arc;

use tokio::sync::RwLock;

use crate::db::models::Reading;

/// Single-slot holder for the most recently decoded `Reading`.
///
/// Cloning shares the slot. The MQTT subscriber is the writer; HTTP
/// handlers read it. Nothing is persisted, so the slot starts empty.
#[derive(Clone, Default)]
pub struct ReadingCache {
    inner: Arc<RwLock<Option<Reading>>>,
}

impl ReadingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached reading unconditionally.
    pub async fn update(&self, reading: Reading) {
        *self.inner.write().await = Some(reading);
    }

    /// Store `reading` only if nothing has been cached yet.
    ///
    /// Returns `true` if the slot was filled.
    pub async fn fill_if_empty(&self, reading: Reading) -> bool {
        let mut guard = self.inner.write().await;
        if guard.is_some() {
            return false;
        }
        *guard = Some(reading);
        true
    }

    pub async fn get(&self) -> Option<Reading> {
        self.inner.read().await.clone()
    }
}
