//! In-memory object store with fault injection for tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::{DashMap, DashSet};

use clientvault_core::error::AppError;
use clientvault_core::result::AppResult;
use clientvault_core::traits::{Disposition, ObjectStore};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
}

/// Object store held in a concurrent map.
///
/// Keys registered with [`fail_copy_from`](Self::fail_copy_from),
/// [`fail_put`](Self::fail_put), or [`fail_delete`](Self::fail_delete)
/// make the matching call fail with a storage error until cleared.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: DashMap<String, StoredObject>,
    failing_copies: DashSet<String>,
    failing_puts: DashSet<String>,
    failing_deletes: DashSet<String>,
    latency_ms: AtomicU64,
    copies: AtomicU64,
    deletes: AtomicU64,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `copy` whose source is `key` fail.
    pub fn fail_copy_from(&self, key: impl Into<String>) {
        self.failing_copies.insert(key.into());
    }

    /// Make every `put` to `key` fail.
    pub fn fail_put(&self, key: impl Into<String>) {
        self.failing_puts.insert(key.into());
    }

    /// Make every `delete` of `key` fail.
    pub fn fail_delete(&self, key: impl Into<String>) {
        self.failing_deletes.insert(key.into());
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.failing_copies.clear();
        self.failing_puts.clear();
        self.failing_deletes.clear();
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Sorted list of stored keys.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Whether an object is stored at `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    /// Bytes stored at `key`.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.objects.get(key).map(|o| o.data.clone())
    }

    /// Content type recorded for `key`.
    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.get(key).and_then(|o| o.content_type.clone())
    }

    /// Number of successful copies so far.
    pub fn copy_count(&self) -> u64 {
        self.copies.load(Ordering::Relaxed)
    }

    /// Number of successful deletes so far.
    pub fn delete_count(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    async fn pause(&self) {
        let ms = self.latency_ms.load(Ordering::Relaxed);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> AppResult<()> {
        self.pause().await;
        if self.failing_puts.contains(key) {
            return Err(AppError::storage(format!("Injected put failure for {key}")));
        }
        self.objects.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.map(str::to_string),
            },
        );
        Ok(())
    }

    async fn copy(&self, from: &str, to: &str) -> AppResult<()> {
        self.pause().await;
        if self.failing_copies.contains(from) {
            return Err(AppError::storage(format!("Injected copy failure for {from}")));
        }
        let object = self
            .objects
            .get(from)
            .map(|o| o.value().clone())
            .ok_or_else(|| AppError::not_found(format!("Object not found: {from}")))?;
        self.objects.insert(to.to_string(), object);
        self.copies.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.pause().await;
        if self.failing_deletes.contains(key) {
            return Err(AppError::storage(format!("Injected delete failure for {key}")));
        }
        if self.objects.remove(key).is_some() {
            self.deletes.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.pause().await;
        Ok(self.objects.contains_key(key))
    }

    async fn signed_url(
        &self,
        key: &str,
        disposition: Disposition,
        file_name: &str,
        ttl: Duration,
    ) -> AppResult<String> {
        Ok(format!(
            "memory://{key}?disposition={disposition}&ttl={}&name={}",
            ttl.as_secs(),
            file_name.replace(' ', "%20")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clientvault_core::error::ErrorKind;

    #[tokio::test]
    async fn test_injected_copy_failure_then_recovery() {
        let store = MemoryObjectStore::new();
        store.put("a/x.pdf", Bytes::from("x"), None).await.unwrap();
        store.fail_copy_from("a/x.pdf");

        let err = store.copy("a/x.pdf", "b/x.pdf").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);
        assert!(!store.contains("b/x.pdf"));

        store.clear_failures();
        store.copy("a/x.pdf", "b/x.pdf").await.unwrap();
        assert_eq!(store.get("b/x.pdf"), Some(Bytes::from("x")));
        assert_eq!(store.copy_count(), 1);
    }

    #[tokio::test]
    async fn test_copy_missing_source_is_not_found() {
        let store = MemoryObjectStore::new();
        let err = store.copy("missing", "other").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let store = MemoryObjectStore::new();
        store.delete("missing").await.unwrap();
        assert_eq!(store.delete_count(), 0);
    }
}
