//! Shared fixtures for the workspace engine tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use clientvault_core::traits::ObjectStore;
use clientvault_core::types::id::{ClientId, FolderId, UserId};
use clientvault_database::repositories::MemoryTreeRepository;
use clientvault_entity::file::File;
use clientvault_entity::folder::{Folder, FolderType};
use clientvault_entity::user::Principal;
use clientvault_service::workspace::{FileUpload, TreeReport};
use clientvault_service::{
    MemoryAuditSink, RequestContext, WorkspaceFacade, WorkspaceService, WorkspaceSettings,
};
use clientvault_storage::{MemoryObjectStore, TimedObjectStore};

/// Engine wired to in-memory collaborators.
pub struct TestApp {
    /// The engine under test.
    pub service: Arc<WorkspaceService>,
    /// DTO facade over the same engine.
    pub facade: WorkspaceFacade,
    /// Backing tree repository.
    pub repo: Arc<MemoryTreeRepository>,
    /// Backing object store.
    pub store: Arc<MemoryObjectStore>,
    /// Recorded events.
    pub audit: Arc<MemoryAuditSink>,
    /// Staff principal.
    pub admin: RequestContext,
}

fn default_settings() -> WorkspaceSettings {
    WorkspaceSettings {
        key_root: "clients".to_string(),
        signed_url_ttl: Duration::from_secs(900),
        max_upload_size_bytes: 1024 * 1024,
        lock_timeout: Duration::from_secs(1),
    }
}

/// A provisioned client tree.
pub struct ClientTree {
    pub client_id: ClientId,
    pub root: Folder,
    pub documents: Folder,
    pub years: Folder,
    /// Context of the client's own principal.
    pub ctx: RequestContext,
}

impl TestApp {
    /// Engine with default limits and a one-second lock timeout.
    pub fn new() -> Self {
        Self::with_settings(default_settings())
    }

    /// Engine with custom settings.
    pub fn with_settings(settings: WorkspaceSettings) -> Self {
        Self::build(settings, None)
    }

    /// Engine whose store calls fail once `timeout` elapses, as in production.
    pub fn with_store_timeout(timeout: Duration) -> Self {
        Self::build(default_settings(), Some(timeout))
    }

    fn build(settings: WorkspaceSettings, store_timeout: Option<Duration>) -> Self {
        let repo = Arc::new(MemoryTreeRepository::new());
        let store = Arc::new(MemoryObjectStore::new());
        let audit = Arc::new(MemoryAuditSink::new());
        let engine_store: Arc<dyn ObjectStore> = match store_timeout {
            Some(timeout) => Arc::new(TimedObjectStore::new(store.clone(), timeout)),
            None => store.clone(),
        };
        let service = Arc::new(WorkspaceService::new(
            repo.clone(),
            engine_store,
            audit.clone(),
            settings,
        ));
        Self {
            facade: WorkspaceFacade::new(service.clone()),
            service,
            repo,
            store,
            audit,
            admin: RequestContext::new(Principal::admin(UserId::new())),
        }
    }

    /// Provision a fresh client and return its structural folders.
    pub async fn provision(&self, name: &str) -> ClientTree {
        let client_id = ClientId::new();
        let root = self
            .service
            .provision_client(&self.admin, client_id, name)
            .await
            .expect("provision client");
        let contents = self
            .service
            .get_folder_contents(&self.admin, root.id)
            .await
            .expect("list root");
        let documents = contents
            .folders
            .into_iter()
            .find(|f| f.folder_type == FolderType::Documents)
            .expect("documents folder");
        let years = self
            .service
            .get_folder_contents(&self.admin, documents.id)
            .await
            .expect("list documents")
            .folders
            .into_iter()
            .find(|f| f.folder_type == FolderType::Years)
            .expect("years folder");

        ClientTree {
            client_id,
            root,
            documents,
            years,
            ctx: RequestContext::new(Principal::client(UserId::new(), client_id)),
        }
    }

    /// Upload `size` bytes under `name`.
    pub async fn upload(&self, folder_id: FolderId, name: &str, size: usize) -> File {
        self.service
            .upload_file(
                &self.admin,
                folder_id,
                FileUpload::new(name, Bytes::from(vec![b'x'; size])),
            )
            .await
            .expect("upload file")
    }

    /// Create a generic folder as admin.
    pub async fn mkdir(&self, parent_id: FolderId, name: &str) -> Folder {
        self.service
            .create_folder(&self.admin, parent_id, name)
            .await
            .expect("create folder")
    }

    /// Re-read a folder.
    pub async fn folder(&self, id: FolderId) -> Folder {
        self.service
            .get_folder_contents(&self.admin, id)
            .await
            .expect("load folder")
            .folder
    }

    /// Full verification report, storage included.
    pub async fn verify(&self, client_id: ClientId) -> TreeReport {
        self.service
            .verify_client_tree(&self.admin, client_id, true)
            .await
            .expect("verify tree")
    }

    /// Panic unless the client's tree passes every check.
    pub async fn assert_consistent(&self, client_id: ClientId) {
        let report = self.verify(client_id).await;
        assert!(
            report.is_consistent(),
            "tree is inconsistent: {:?}",
            report.violations
        );
    }
}
