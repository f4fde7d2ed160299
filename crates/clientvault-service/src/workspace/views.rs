//! Read models returned by the engine.

use serde::{Deserialize, Serialize};

use clientvault_entity::file::File;
use clientvault_entity::folder::{Breadcrumb, Folder};

/// A folder with its direct children and its position in the tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderContents {
    /// The folder itself.
    pub folder: Folder,
    /// Direct child folders, ordered by name.
    pub folders: Vec<Folder>,
    /// Files directly in the folder, ordered by display name.
    pub files: Vec<File>,
    /// Chain from the client root down to the folder, both included.
    pub breadcrumbs: Vec<Breadcrumb>,
}

/// A time-limited download URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadLink {
    /// Signed URL.
    pub url: String,
    /// Display name the download should be saved as.
    pub file_name: String,
    /// Seconds until the URL stops working.
    pub expires_in_seconds: u64,
}
