//! Data transfer objects returned by [`WorkspaceFacade`](super::WorkspaceFacade).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use clientvault_entity::file::File;
use clientvault_entity::folder::{Aggregates, Breadcrumb, Folder, FolderNode};

use crate::workspace::{DownloadLink, FolderContents};

/// Folder summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderDto {
    /// Folder ID.
    pub id: Uuid,
    /// Parent folder ID.
    pub parent_id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// Folder type.
    pub folder_type: String,
    /// Files in the subtree.
    pub file_count: i64,
    /// Descendant folders.
    pub folder_count: i64,
    /// Bytes in the subtree.
    pub total_size: i64,
    /// Last modification.
    pub updated_at: DateTime<Utc>,
}

impl From<&Folder> for FolderDto {
    fn from(folder: &Folder) -> Self {
        Self {
            id: folder.id.into_uuid(),
            parent_id: folder.parent_id.map(|id| id.into_uuid()),
            name: folder.name.clone(),
            folder_type: folder.folder_type.to_string(),
            file_count: folder.file_count,
            folder_count: folder.folder_count,
            total_size: folder.total_size,
            updated_at: folder.updated_at,
        }
    }
}

/// File summary. Storage keys are not exposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDto {
    /// File ID.
    pub id: Uuid,
    /// Containing folder.
    pub folder_id: Uuid,
    /// Display name.
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: i64,
    /// Uploader.
    pub uploaded_by: Uuid,
    /// Upload time.
    pub created_at: DateTime<Utc>,
}

impl From<&File> for FileDto {
    fn from(file: &File) -> Self {
        Self {
            id: file.id.into_uuid(),
            folder_id: file.folder_id.into_uuid(),
            name: file.original_name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.size,
            uploaded_by: file.uploaded_by.into_uuid(),
            created_at: file.created_at,
        }
    }
}

/// A folder with its nested children and files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceTreeDto {
    /// The folder.
    pub folder: FolderDto,
    /// Child folders, ordered by name.
    pub children: Vec<WorkspaceTreeDto>,
    /// Files directly in the folder.
    pub files: Vec<FileDto>,
}

impl From<&FolderNode> for WorkspaceTreeDto {
    fn from(node: &FolderNode) -> Self {
        Self {
            folder: FolderDto::from(&node.folder),
            children: node.children.iter().map(WorkspaceTreeDto::from).collect(),
            files: node.files.iter().map(FileDto::from).collect(),
        }
    }
}

/// One breadcrumb step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreadcrumbDto {
    /// Folder ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
}

impl From<&Breadcrumb> for BreadcrumbDto {
    fn from(crumb: &Breadcrumb) -> Self {
        Self {
            id: crumb.id.into_uuid(),
            name: crumb.name.clone(),
        }
    }
}

/// Listing of one folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderContentsDto {
    /// The folder.
    pub folder: FolderDto,
    /// Direct child folders.
    pub folders: Vec<FolderDto>,
    /// Direct files.
    pub files: Vec<FileDto>,
    /// Root to folder.
    pub breadcrumbs: Vec<BreadcrumbDto>,
}

impl From<&FolderContents> for FolderContentsDto {
    fn from(contents: &FolderContents) -> Self {
        Self {
            folder: FolderDto::from(&contents.folder),
            folders: contents.folders.iter().map(FolderDto::from).collect(),
            files: contents.files.iter().map(FileDto::from).collect(),
            breadcrumbs: contents.breadcrumbs.iter().map(BreadcrumbDto::from).collect(),
        }
    }
}

/// A download URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadDto {
    /// Signed URL.
    pub url: String,
    /// Display name.
    pub file_name: String,
    /// Seconds until expiry.
    pub expires_in: u64,
}

impl From<DownloadLink> for DownloadDto {
    fn from(link: DownloadLink) -> Self {
        Self {
            url: link.url,
            file_name: link.file_name,
            expires_in: link.expires_in_seconds,
        }
    }
}

/// What a delete removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeletedDto {
    /// Folders removed, the target included.
    pub folders: i64,
    /// Files removed.
    pub files: i64,
    /// Bytes released.
    pub bytes: i64,
}

impl From<Aggregates> for DeletedDto {
    fn from(removed: Aggregates) -> Self {
        Self {
            folders: removed.folders,
            files: removed.files,
            bytes: removed.bytes,
        }
    }
}
