//! Per-call timeout decorator for any object store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::warn;

use clientvault_core::error::AppError;
use clientvault_core::result::AppResult;
use clientvault_core::traits::{Disposition, ObjectStore};

/// Wraps a store so that every call fails with a storage error once
/// `timeout` elapses.
#[derive(Debug, Clone)]
pub struct TimedObjectStore {
    inner: Arc<dyn ObjectStore>,
    timeout: Duration,
}

impl TimedObjectStore {
    /// Wrap `inner` with a per-call `timeout`.
    pub fn new(inner: Arc<dyn ObjectStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T: Send>(
        &self,
        operation: &str,
        key: &str,
        call: impl Future<Output = AppResult<T>> + Send,
    ) -> AppResult<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    provider = self.inner.provider_type(),
                    operation,
                    key,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Object storage call timed out"
                );
                Err(AppError::storage(format!(
                    "Object storage {operation} timed out after {} ms: {key}",
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

#[async_trait]
impl ObjectStore for TimedObjectStore {
    fn provider_type(&self) -> &str {
        self.inner.provider_type()
    }

    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> AppResult<()> {
        self.bounded("put", key, self.inner.put(key, data, content_type))
            .await
    }

    async fn copy(&self, from: &str, to: &str) -> AppResult<()> {
        self.bounded("copy", from, self.inner.copy(from, to)).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.bounded("delete", key, self.inner.delete(key)).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.bounded("exists", key, self.inner.exists(key)).await
    }

    async fn signed_url(
        &self,
        key: &str,
        disposition: Disposition,
        file_name: &str,
        ttl: Duration,
    ) -> AppResult<String> {
        self.bounded(
            "sign",
            key,
            self.inner.signed_url(key, disposition, file_name, ttl),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MemoryObjectStore;
    use clientvault_core::error::ErrorKind;

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out_as_storage_failure() {
        let memory = Arc::new(MemoryObjectStore::new());
        memory.set_latency(Duration::from_secs(10));
        let store = TimedObjectStore::new(memory.clone(), Duration::from_millis(500));

        let err = store
            .put("clients/c1/a.pdf", Bytes::from("a"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);
        assert!(err.message.contains("timed out"));
        assert!(!memory.contains("clients/c1/a.pdf"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_call_passes_through() {
        let memory = Arc::new(MemoryObjectStore::new());
        let store = TimedObjectStore::new(memory.clone(), Duration::from_millis(500));
        store.put("k", Bytes::from("v"), None).await.unwrap();
        assert!(store.exists("k").await.unwrap());
        assert_eq!(store.provider_type(), "memory");
    }
}
