//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use clientvault_core::types::id::{ClientId, FileId, FolderId, UserId};

/// A file stored in a client's workspace.
///
/// `file_name` is generated at upload and never changes; `original_name`
/// is the display name and is the only thing a rename touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Unique file identifier.
    pub id: FileId,
    /// Owning client (denormalized from the folder).
    pub client_id: ClientId,
    /// The folder containing this file.
    pub folder_id: FolderId,
    /// Generated storage-safe name.
    pub file_name: String,
    /// User-facing display name.
    pub original_name: String,
    /// MIME type of the content.
    pub mime_type: String,
    /// Size in bytes.
    pub size: i64,
    /// Full object key, `folder.s3_prefix + file_name`.
    pub s3_path: String,
    /// The principal who uploaded the file.
    pub uploaded_by: UserId,
    /// When the file was uploaded.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// Get the display name's extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        self.original_name
            .rsplit('.')
            .next()
            .filter(|ext| *ext != self.original_name)
            .map(|ext| ext.to_lowercase())
    }
}

/// Data required to insert a new file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFile {
    /// Identifier assigned by the caller.
    pub id: FileId,
    /// Owning client.
    pub client_id: ClientId,
    /// Target folder.
    pub folder_id: FolderId,
    /// Generated storage name.
    pub file_name: String,
    /// Display name.
    pub original_name: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: i64,
    /// Object key.
    pub s3_path: String,
    /// Uploading principal.
    pub uploaded_by: UserId,
}

impl NewFile {
    /// Materialize the record.
    pub fn into_file(self, now: DateTime<Utc>) -> File {
        File {
            id: self.id,
            client_id: self.client_id,
            folder_id: self.folder_id,
            file_name: self.file_name,
            original_name: self.original_name,
            mime_type: self.mime_type,
            size: self.size,
            s3_path: self.s3_path,
            uploaded_by: self.uploaded_by,
            created_at: now,
            updated_at: now,
        }
    }
}
