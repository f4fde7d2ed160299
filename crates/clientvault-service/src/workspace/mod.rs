//! The workspace tree engine.
//!
//! [`WorkspaceService`] is split by concern: folder operations live in
//! `folders`, file operations in `files`, and provisioning and repair in
//! `maintenance`. Every mutating call takes the per-client lock, re-reads
//! the records it acts on, validates, and only then touches storage.

pub mod consistency;
pub mod content_type;
pub mod files;
pub mod folders;
pub mod lock;
pub mod maintenance;
pub mod migration;
pub mod path;
pub mod views;

use std::sync::Arc;
use std::time::Duration;

use clientvault_auth::{AccessGate, WorkspaceAction};
use clientvault_core::config::{AppConfig, StorageConfig, WorkspaceConfig};
use clientvault_core::error::AppError;
use clientvault_core::events::{DomainEvent, WorkspaceEvent};
use clientvault_core::result::AppResult;
use clientvault_core::traits::{AuditSink, ObjectStore};
use clientvault_core::types::id::{ClientId, FileId, FolderId};
use clientvault_database::repositories::TreeRepository;
use clientvault_entity::file::File;
use clientvault_entity::folder::Folder;

use crate::context::RequestContext;

use self::lock::{ClientLockGuard, ClientLocks};

pub use self::consistency::{TreeReport, Violation};
pub use self::files::FileUpload;
pub use self::views::{DownloadLink, FolderContents};

/// Tunables of the engine.
#[derive(Debug, Clone)]
pub struct WorkspaceSettings {
    /// Leading key segment of every client tree.
    pub key_root: String,
    /// Lifetime of download URLs.
    pub signed_url_ttl: Duration,
    /// Largest accepted upload in bytes.
    pub max_upload_size_bytes: u64,
    /// How long to wait for the per-client lock.
    pub lock_timeout: Duration,
}

impl WorkspaceSettings {
    /// Take the engine settings from the application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::from_sections(&config.storage, &config.workspace)
    }

    /// Build settings from the storage and workspace sections.
    pub fn from_sections(storage: &StorageConfig, workspace: &WorkspaceConfig) -> Self {
        Self {
            key_root: storage.key_root.clone(),
            signed_url_ttl: storage.signed_url_ttl(),
            max_upload_size_bytes: workspace.max_upload_size_bytes,
            lock_timeout: workspace.lock_timeout(),
        }
    }
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self::from_sections(&StorageConfig::default(), &WorkspaceConfig::default())
    }
}

/// Keeps client folder trees and their stored objects consistent.
#[derive(Clone)]
pub struct WorkspaceService {
    /// Folder and file records.
    repo: Arc<dyn TreeRepository>,
    /// File bytes.
    store: Arc<dyn ObjectStore>,
    /// Ownership checks.
    gate: AccessGate,
    /// Per-client mutation locks.
    locks: Arc<ClientLocks>,
    /// Receives one event per committed mutation.
    audit: Arc<dyn AuditSink>,
    settings: WorkspaceSettings,
}

impl std::fmt::Debug for WorkspaceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceService")
            .field("store", &self.store.provider_type())
            .field("settings", &self.settings)
            .finish()
    }
}

impl WorkspaceService {
    /// Creates a new workspace service.
    pub fn new(
        repo: Arc<dyn TreeRepository>,
        store: Arc<dyn ObjectStore>,
        audit: Arc<dyn AuditSink>,
        settings: WorkspaceSettings,
    ) -> Self {
        Self {
            repo,
            store,
            gate: AccessGate::new(),
            locks: Arc::new(ClientLocks::new(settings.lock_timeout)),
            audit,
            settings,
        }
    }

    /// The engine settings.
    pub fn settings(&self) -> &WorkspaceSettings {
        &self.settings
    }

    async fn load_folder(&self, id: FolderId) -> AppResult<Folder> {
        self.repo
            .find_folder(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))
    }

    async fn load_file(&self, id: FileId) -> AppResult<File> {
        self.repo
            .find_file(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))
    }

    /// Load a folder and check that the caller may act on it.
    async fn authorized_folder(
        &self,
        ctx: &RequestContext,
        id: FolderId,
        action: WorkspaceAction,
    ) -> AppResult<Folder> {
        let folder = self.load_folder(id).await?;
        self.gate.require(&ctx.principal, &folder, action)?;
        Ok(folder)
    }

    /// Load a file and check that the caller may act on it.
    async fn authorized_file(
        &self,
        ctx: &RequestContext,
        id: FileId,
        action: WorkspaceAction,
    ) -> AppResult<File> {
        let file = self.load_file(id).await?;
        self.gate.require(&ctx.principal, &file, action)?;
        Ok(file)
    }

    async fn lock(&self, client_id: ClientId) -> AppResult<ClientLockGuard> {
        self.locks.acquire(client_id).await
    }

    /// IDs from the client root down to `folder_id`, both included.
    async fn chain_ids(&self, folder_id: FolderId) -> AppResult<Vec<FolderId>> {
        Ok(self
            .repo
            .find_ancestors(folder_id)
            .await?
            .iter()
            .map(|f| f.id)
            .collect())
    }

    fn emit(&self, ctx: &RequestContext, client_id: ClientId, event: WorkspaceEvent) {
        self.audit
            .record(DomainEvent::new(Some(ctx.user_id()), client_id, event));
    }
}
