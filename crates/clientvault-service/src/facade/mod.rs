//! Transport-facing facade over the workspace engine.
//!
//! Every method takes the caller's [`RequestContext`] and returns an
//! explicit DTO; entity records and storage keys stay inside the engine.

pub mod dto;

use std::sync::Arc;

use clientvault_core::result::AppResult;
use clientvault_core::types::id::{ClientId, FileId, FolderId};

use crate::context::RequestContext;
use crate::workspace::{FileUpload, WorkspaceService};

pub use self::dto::{
    BreadcrumbDto, DeletedDto, DownloadDto, FileDto, FolderContentsDto, FolderDto,
    WorkspaceTreeDto,
};

/// The workspace operations exposed to clients and staff.
#[derive(Debug, Clone)]
pub struct WorkspaceFacade {
    service: Arc<WorkspaceService>,
}

impl WorkspaceFacade {
    /// Creates a facade over `service`.
    pub fn new(service: Arc<WorkspaceService>) -> Self {
        Self { service }
    }

    /// The wrapped engine.
    pub fn service(&self) -> &Arc<WorkspaceService> {
        &self.service
    }

    /// Full folder tree of a client.
    pub async fn get_client_workspace(
        &self,
        ctx: &RequestContext,
        client_id: ClientId,
    ) -> AppResult<WorkspaceTreeDto> {
        let tree = self.service.get_client_workspace(ctx, client_id).await?;
        Ok(WorkspaceTreeDto::from(&tree))
    }

    /// One folder's listing with breadcrumbs.
    pub async fn get_folder_contents(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
    ) -> AppResult<FolderContentsDto> {
        let contents = self.service.get_folder_contents(ctx, folder_id).await?;
        Ok(FolderContentsDto::from(&contents))
    }

    /// Upload a file.
    pub async fn upload_file(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        upload: FileUpload,
    ) -> AppResult<FileDto> {
        let file = self.service.upload_file(ctx, folder_id, upload).await?;
        Ok(FileDto::from(&file))
    }

    /// Signed download URL; `preview` renders inline instead of downloading.
    pub async fn get_file_download_url(
        &self,
        ctx: &RequestContext,
        file_id: FileId,
        preview: bool,
    ) -> AppResult<DownloadDto> {
        let link = self
            .service
            .get_file_download_url(ctx, file_id, preview)
            .await?;
        Ok(DownloadDto::from(link))
    }

    /// Rename a file.
    pub async fn rename_file(
        &self,
        ctx: &RequestContext,
        file_id: FileId,
        new_name: &str,
    ) -> AppResult<FileDto> {
        let file = self.service.rename_file(ctx, file_id, new_name).await?;
        Ok(FileDto::from(&file))
    }

    /// Move a file to another folder.
    pub async fn move_file(
        &self,
        ctx: &RequestContext,
        file_id: FileId,
        target_folder_id: FolderId,
    ) -> AppResult<FileDto> {
        let file = self
            .service
            .move_file(ctx, file_id, target_folder_id)
            .await?;
        Ok(FileDto::from(&file))
    }

    /// Delete a file.
    pub async fn delete_file(&self, ctx: &RequestContext, file_id: FileId) -> AppResult<DeletedDto> {
        let file = self.service.delete_file(ctx, file_id).await?;
        Ok(DeletedDto {
            folders: 0,
            files: 1,
            bytes: file.size,
        })
    }

    /// Create a folder.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        parent_id: FolderId,
        name: &str,
    ) -> AppResult<FolderDto> {
        let folder = self.service.create_folder(ctx, parent_id, name).await?;
        Ok(FolderDto::from(&folder))
    }

    /// Rename a folder.
    pub async fn rename_folder(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        new_name: &str,
    ) -> AppResult<FolderDto> {
        let folder = self.service.rename_folder(ctx, folder_id, new_name).await?;
        Ok(FolderDto::from(&folder))
    }

    /// Move a folder under another parent.
    pub async fn move_folder(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        new_parent_id: FolderId,
    ) -> AppResult<FolderDto> {
        let folder = self
            .service
            .move_folder(ctx, folder_id, new_parent_id)
            .await?;
        Ok(FolderDto::from(&folder))
    }

    /// Delete a folder and everything in it.
    pub async fn delete_folder(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
    ) -> AppResult<DeletedDto> {
        let removed = self.service.delete_folder(ctx, folder_id).await?;
        Ok(DeletedDto::from(removed))
    }

    /// Create a year folder.
    pub async fn add_year_folder(
        &self,
        ctx: &RequestContext,
        client_id: ClientId,
        year: &str,
    ) -> AppResult<FolderDto> {
        let folder = self.service.add_year_folder(ctx, client_id, year).await?;
        Ok(FolderDto::from(&folder))
    }
}
