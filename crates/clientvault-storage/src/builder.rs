//! Builds the configured object store.

use std::sync::Arc;

use tracing::info;

use clientvault_core::config::{StorageConfig, StorageProviderKind};
use clientvault_core::error::AppError;
use clientvault_core::result::AppResult;
use clientvault_core::traits::ObjectStore;

use crate::providers::LocalObjectStore;
use crate::signing::UrlSigner;
use crate::timed::TimedObjectStore;

/// Create the object store selected by `config`, bounded by its per-call timeout.
pub async fn build_object_store(config: &StorageConfig) -> AppResult<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match config.provider {
        StorageProviderKind::Local => {
            if config.local.signing_secret.is_empty() {
                return Err(AppError::configuration(
                    "storage.local.signing_secret must be set",
                ));
            }
            let signer = UrlSigner::new(
                config.local.public_base_url.clone(),
                config.local.signing_secret.clone(),
            );
            Arc::new(LocalObjectStore::new(&config.local.root_path, signer).await?)
        }
        #[cfg(feature = "s3")]
        StorageProviderKind::S3 => {
            Arc::new(crate::providers::S3ObjectStore::new(&config.s3).await?)
        }
        #[cfg(not(feature = "s3"))]
        StorageProviderKind::S3 => {
            return Err(AppError::configuration(
                "S3 storage requires building with the `s3` feature",
            ));
        }
    };

    info!(
        provider = store.provider_type(),
        timeout_ms = config.operation_timeout_ms,
        "Object store ready"
    );
    Ok(Arc::new(TimedObjectStore::new(
        store,
        config.operation_timeout(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clientvault_core::config::LocalStorageConfig;
    use clientvault_core::error::ErrorKind;

    #[tokio::test]
    async fn test_local_store_requires_signing_secret() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StorageConfig {
            local: LocalStorageConfig {
                root_path: dir.path().to_string_lossy().to_string(),
                ..LocalStorageConfig::default()
            },
            ..StorageConfig::default()
        };
        let err = build_object_store(&config).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);

        config.local.signing_secret = "secret".to_string();
        let store = build_object_store(&config).await.unwrap();
        assert_eq!(store.provider_type(), "local");
    }
}
