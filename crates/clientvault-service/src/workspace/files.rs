//! File operations: upload, rename, move, delete, download.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use clientvault_auth::WorkspaceAction;
use clientvault_core::error::AppError;
use clientvault_core::events::WorkspaceEvent;
use clientvault_core::result::AppResult;
use clientvault_core::traits::Disposition;
use clientvault_core::types::id::{FileId, FolderId};
use clientvault_database::repositories::{AggregateTransfer, FileRelocation};
use clientvault_entity::file::{File, NewFile};
use clientvault_entity::folder::{Aggregates, FolderType};

use super::WorkspaceService;
use super::content_type;
use super::migration::{ObjectMove, copy_object};
use super::path;
use super::views::DownloadLink;
use crate::context::RequestContext;

/// An upload as received from the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUpload {
    /// Display name chosen by the uploader.
    pub original_name: String,
    /// Declared MIME type, if any.
    pub content_type: Option<String>,
    /// File content.
    #[serde(skip)]
    pub data: Bytes,
}

impl FileUpload {
    /// Build an upload without a declared content type.
    pub fn new(original_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            original_name: original_name.into(),
            content_type: None,
            data: data.into(),
        }
    }
}

impl WorkspaceService {
    /// Store a new file in a folder.
    ///
    /// The object is written first; if the record cannot be inserted the
    /// object is removed again so no unreferenced upload is left behind.
    pub async fn upload_file(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        upload: FileUpload,
    ) -> AppResult<File> {
        let folder = self
            .authorized_folder(ctx, folder_id, WorkspaceAction::Modify)
            .await?;

        let original_name = path::display_name(&upload.original_name)?;
        let size = upload.data.len() as u64;
        if size > self.settings.max_upload_size_bytes {
            return Err(AppError::validation(format!(
                "File size {size} exceeds the maximum of {} bytes",
                self.settings.max_upload_size_bytes
            )));
        }

        let _guard = self.lock(folder.client_id).await?;
        let folder = self.load_folder(folder.id).await?;
        if !accepts_files(folder.folder_type) {
            return Err(AppError::invalid_operation(format!(
                "Files cannot be stored directly in the {} folder",
                folder.folder_type
            )));
        }

        let ancestors = self.chain_ids(folder.id).await?;
        let mime_type = content_type::resolve(upload.content_type.as_deref(), &original_name);
        let file_name = path::generate_file_name(&original_name);
        let key = path::key_of(&folder.s3_prefix, &file_name);

        self.store
            .put(&key, upload.data, Some(&mime_type))
            .await?;

        let record = NewFile {
            id: FileId::new(),
            client_id: folder.client_id,
            folder_id: folder.id,
            file_name,
            original_name,
            mime_type,
            size: size as i64,
            s3_path: key.clone(),
            uploaded_by: ctx.user_id(),
        };
        let file = match self.repo.insert_file(&record, &ancestors).await {
            Ok(file) => file,
            Err(e) => {
                if let Err(cleanup) = self.store.delete(&key).await {
                    warn!(
                        key = %key,
                        error = %cleanup,
                        "Failed to remove object of rejected upload"
                    );
                }
                return Err(e);
            }
        };

        info!(
            user_id = %ctx.user_id(),
            client_id = %file.client_id,
            file_id = %file.id,
            folder_id = %folder.id,
            size,
            key = %file.s3_path,
            "File uploaded"
        );
        self.emit(
            ctx,
            file.client_id,
            WorkspaceEvent::FileUploaded {
                file_id: file.id,
                folder_id: folder.id,
                original_name: file.original_name.clone(),
                size,
            },
        );
        Ok(file)
    }

    /// Change a file's display name. The stored object is not touched.
    pub async fn rename_file(
        &self,
        ctx: &RequestContext,
        file_id: FileId,
        new_name: &str,
    ) -> AppResult<File> {
        let file = self
            .authorized_file(ctx, file_id, WorkspaceAction::Modify)
            .await?;
        let new_name = path::display_name(new_name)?;
        let _guard = self.lock(file.client_id).await?;
        let file = self.load_file(file.id).await?;

        if file.original_name == new_name {
            return Ok(file);
        }
        let old_name = file.original_name.clone();
        let renamed = self.repo.rename_file(file.id, &new_name).await?;

        info!(
            user_id = %ctx.user_id(),
            file_id = %renamed.id,
            old_name = %old_name,
            new_name = %renamed.original_name,
            "File renamed"
        );
        self.emit(
            ctx,
            renamed.client_id,
            WorkspaceEvent::FileRenamed {
                file_id: renamed.id,
                old_name,
                new_name: renamed.original_name.clone(),
            },
        );
        Ok(renamed)
    }

    /// Move a file into another folder of the same client.
    pub async fn move_file(
        &self,
        ctx: &RequestContext,
        file_id: FileId,
        target_folder_id: FolderId,
    ) -> AppResult<File> {
        let file = self
            .authorized_file(ctx, file_id, WorkspaceAction::Modify)
            .await?;
        self.authorized_folder(ctx, target_folder_id, WorkspaceAction::Modify)
            .await?;
        let _guard = self.lock(file.client_id).await?;
        let file = self.load_file(file_id).await?;
        let target = self.load_folder(target_folder_id).await?;

        if target.client_id != file.client_id {
            return Err(AppError::invalid_operation(
                "Files cannot be moved between clients",
            ));
        }
        if !accepts_files(target.folder_type) {
            return Err(AppError::invalid_operation(format!(
                "Files cannot be stored directly in the {} folder",
                target.folder_type
            )));
        }
        if target.id == file.folder_id {
            return Ok(file);
        }

        let from_chain = self.chain_ids(file.folder_id).await?;
        let to_chain = self.chain_ids(target.id).await?;
        let object = ObjectMove {
            file_id: file.id,
            original_name: file.original_name.clone(),
            from: file.s3_path.clone(),
            to: path::key_of(&target.s3_prefix, &file.file_name),
        };
        copy_object(self.store.as_ref(), &object).await?;

        let relocation = FileRelocation {
            file_id: file.id,
            folder_id: target.id,
            s3_path: object.to.clone(),
            transfer: AggregateTransfer {
                from: from_chain,
                to: to_chain,
                amount: Aggregates::one_file(file.size),
            },
        };
        let moved = self.repo.relocate_file(&relocation).await?;

        if let Err(e) = self.store.delete(&object.from).await {
            warn!(
                file_id = %file.id,
                key = %object.from,
                error = %e,
                "Failed to delete old object after file move; leaving orphan"
            );
        }

        info!(
            user_id = %ctx.user_id(),
            file_id = %moved.id,
            from_folder_id = %file.folder_id,
            to_folder_id = %target.id,
            key = %moved.s3_path,
            "File moved"
        );
        self.emit(
            ctx,
            moved.client_id,
            WorkspaceEvent::FileMoved {
                file_id: moved.id,
                from_folder_id: file.folder_id,
                to_folder_id: target.id,
            },
        );
        Ok(moved)
    }

    /// Delete a file record, then its object. Returns the removed record.
    pub async fn delete_file(&self, ctx: &RequestContext, file_id: FileId) -> AppResult<File> {
        let file = self
            .authorized_file(ctx, file_id, WorkspaceAction::Modify)
            .await?;
        let _guard = self.lock(file.client_id).await?;
        let file = self.load_file(file.id).await?;

        let ancestors = self.chain_ids(file.folder_id).await?;
        self.repo.delete_file(file.id, &ancestors).await?;

        if let Err(e) = self.store.delete(&file.s3_path).await {
            warn!(
                file_id = %file.id,
                key = %file.s3_path,
                error = %e,
                "Failed to delete object of removed file; leaving orphan"
            );
        }

        info!(
            user_id = %ctx.user_id(),
            file_id = %file.id,
            folder_id = %file.folder_id,
            "File deleted"
        );
        self.emit(
            ctx,
            file.client_id,
            WorkspaceEvent::FileDeleted {
                file_id: file.id,
                folder_id: file.folder_id,
                original_name: file.original_name.clone(),
            },
        );
        Ok(file)
    }

    /// Issue a time-limited URL for a file. `preview` asks for inline display.
    pub async fn get_file_download_url(
        &self,
        ctx: &RequestContext,
        file_id: FileId,
        preview: bool,
    ) -> AppResult<DownloadLink> {
        let file = self
            .authorized_file(ctx, file_id, WorkspaceAction::View)
            .await?;
        let disposition = if preview {
            Disposition::Inline
        } else {
            Disposition::Attachment
        };
        let ttl = self.settings.signed_url_ttl;
        let url = self
            .store
            .signed_url(&file.s3_path, disposition, &file.original_name, ttl)
            .await?;

        Ok(DownloadLink {
            url,
            file_name: file.original_name,
            expires_in_seconds: ttl.as_secs(),
        })
    }
}

/// Files live in documents, year, and user folders; never in the root or
/// the years container.
fn accepts_files(folder_type: FolderType) -> bool {
    !matches!(folder_type, FolderType::Root | FolderType::Years)
}
