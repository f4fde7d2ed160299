//! Workspace tree events.

use serde::{Deserialize, Serialize};

use crate::types::id::{FileId, FolderId};

/// Events describing committed changes to a client's workspace tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkspaceEvent {
    /// A client workspace was seeded with its structural folders.
    Provisioned {
        /// The new root folder.
        root_id: FolderId,
    },
    /// A folder was created.
    FolderCreated {
        /// The folder ID.
        folder_id: FolderId,
        /// The parent folder.
        parent_id: FolderId,
        /// Display name.
        name: String,
    },
    /// A folder was renamed; every object beneath it moved to a new prefix.
    FolderRenamed {
        /// The folder ID.
        folder_id: FolderId,
        /// Previous object prefix.
        old_prefix: String,
        /// New object prefix.
        new_prefix: String,
        /// Number of objects relocated.
        objects_moved: u64,
    },
    /// A folder was moved under a new parent.
    FolderMoved {
        /// The folder ID.
        folder_id: FolderId,
        /// Previous parent.
        from_parent_id: FolderId,
        /// New parent.
        to_parent_id: FolderId,
        /// Number of objects relocated.
        objects_moved: u64,
    },
    /// A folder and its subtree were deleted.
    FolderDeleted {
        /// The folder ID.
        folder_id: FolderId,
        /// Object prefix the subtree lived under.
        prefix: String,
        /// Number of file records removed.
        files_removed: u64,
    },
    /// A file was uploaded.
    FileUploaded {
        /// The file ID.
        file_id: FileId,
        /// The containing folder.
        folder_id: FolderId,
        /// Display name.
        original_name: String,
        /// Size in bytes.
        size: u64,
    },
    /// A file display name changed.
    FileRenamed {
        /// The file ID.
        file_id: FileId,
        /// Previous display name.
        old_name: String,
        /// New display name.
        new_name: String,
    },
    /// A file moved to another folder.
    FileMoved {
        /// The file ID.
        file_id: FileId,
        /// Source folder.
        from_folder_id: FolderId,
        /// Destination folder.
        to_folder_id: FolderId,
    },
    /// A file was deleted.
    FileDeleted {
        /// The file ID.
        file_id: FileId,
        /// The folder it was in.
        folder_id: FolderId,
        /// Display name (for the activity log after deletion).
        original_name: String,
    },
    /// Subtree aggregates were recomputed from live records.
    AggregatesRecomputed {
        /// Number of folders whose stored totals were wrong.
        corrected: u64,
    },
}

impl WorkspaceEvent {
    /// Short machine-readable name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Provisioned { .. } => "workspace.provisioned",
            Self::FolderCreated { .. } => "folder.created",
            Self::FolderRenamed { .. } => "folder.renamed",
            Self::FolderMoved { .. } => "folder.moved",
            Self::FolderDeleted { .. } => "folder.deleted",
            Self::FileUploaded { .. } => "file.uploaded",
            Self::FileRenamed { .. } => "file.renamed",
            Self::FileMoved { .. } => "file.moved",
            Self::FileDeleted { .. } => "file.deleted",
            Self::AggregatesRecomputed { .. } => "workspace.aggregates_recomputed",
        }
    }
}
