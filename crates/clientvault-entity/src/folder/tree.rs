//! Folder tree structures for hierarchical display.

use serde::{Deserialize, Serialize};

use clientvault_core::types::id::FolderId;

use super::kind::FolderType;
use super::model::Folder;
use crate::file::File;

/// A node in a client's workspace tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderNode {
    /// The folder record.
    pub folder: Folder,
    /// Child folder nodes, ordered by name.
    pub children: Vec<FolderNode>,
    /// Files directly in this folder, ordered by display name.
    pub files: Vec<File>,
}

impl FolderNode {
    /// Number of nodes in this subtree, the node itself included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(FolderNode::node_count).sum::<usize>()
    }

    /// Find a node by folder ID.
    pub fn find(&self, id: FolderId) -> Option<&FolderNode> {
        if self.folder.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// One step of a breadcrumb trail from the root to a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// Folder ID.
    pub id: FolderId,
    /// Display name.
    pub name: String,
    /// Folder type.
    pub folder_type: FolderType,
}

impl From<&Folder> for Breadcrumb {
    fn from(folder: &Folder) -> Self {
        Self {
            id: folder.id,
            name: folder.name.clone(),
            folder_type: folder.folder_type,
        }
    }
}
