//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use clientvault_core::types::id::{ClientId, FolderId};

use super::aggregate::Aggregates;
use super::kind::FolderType;

/// A folder in a client's workspace tree.
///
/// `s3_prefix` is derived from the ancestor chain and always equals
/// `parent.s3_prefix + slug + "/"`. The aggregate counters are subtree
/// totals; a folder does not count itself in `folder_count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: FolderId,
    /// Owning client, identical across the whole tree.
    pub client_id: ClientId,
    /// Parent folder ID (null only for the client root).
    pub parent_id: Option<FolderId>,
    /// Display name.
    pub name: String,
    /// Key-safe name, unique among siblings.
    pub slug: String,
    /// Position in the folder taxonomy.
    pub folder_type: FolderType,
    /// Object storage prefix for everything beneath this folder.
    pub s3_prefix: String,
    /// Number of files in the subtree.
    pub file_count: i64,
    /// Number of descendant folders.
    pub folder_count: i64,
    /// Sum of descendant file sizes in bytes.
    pub total_size: i64,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Check if this is a root folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// The stored subtree totals, not counting this folder.
    pub fn aggregates(&self) -> Aggregates {
        Aggregates {
            folders: self.folder_count,
            files: self.file_count,
            bytes: self.total_size,
        }
    }

    /// The totals this folder contributes to its ancestors (itself included).
    pub fn contribution(&self) -> Aggregates {
        self.aggregates() + Aggregates::one_folder()
    }
}

/// Data required to insert a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFolder {
    /// Identifier assigned by the caller.
    pub id: FolderId,
    /// Owning client.
    pub client_id: ClientId,
    /// Parent folder (None for root).
    pub parent_id: Option<FolderId>,
    /// Display name.
    pub name: String,
    /// Unique slug among siblings.
    pub slug: String,
    /// Folder type.
    pub folder_type: FolderType,
    /// Precomputed object prefix.
    pub s3_prefix: String,
}

impl NewFolder {
    /// Materialize the record with zero aggregates.
    pub fn into_folder(self, now: DateTime<Utc>) -> Folder {
        Folder {
            id: self.id,
            client_id: self.client_id,
            parent_id: self.parent_id,
            name: self.name,
            slug: self.slug,
            folder_type: self.folder_type,
            s3_prefix: self.s3_prefix,
            file_count: 0,
            folder_count: 0,
            total_size: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
