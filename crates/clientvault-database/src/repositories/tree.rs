//! Persistence contract for client workspace trees.

use std::fmt::Debug;

use async_trait::async_trait;

use clientvault_core::result::AppResult;
use clientvault_core::types::id::{ClientId, FileId, FolderId};
use clientvault_entity::file::{File, NewFile};
use clientvault_entity::folder::{Aggregates, Folder, FolderType, NewFolder};

/// A folder together with everything beneath it.
#[derive(Debug, Clone, Default)]
pub struct Subtree {
    /// Folders in pre-order, the subtree root first.
    pub folders: Vec<Folder>,
    /// Every file whose folder is in `folders`.
    pub files: Vec<File>,
}

impl Subtree {
    /// Totals this subtree contributes to the ancestors of its root.
    pub fn contribution(&self) -> Aggregates {
        let mut total = Aggregates::default();
        for _ in &self.folders {
            total += Aggregates::one_folder();
        }
        for file in &self.files {
            total += Aggregates::one_file(file.size);
        }
        total
    }
}

/// Moves `amount` off one ancestor chain and onto another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateTransfer {
    /// Chain losing the amount.
    pub from: Vec<FolderId>,
    /// Chain gaining the amount.
    pub to: Vec<FolderId>,
    /// Totals being transferred.
    pub amount: Aggregates,
}

/// The metadata half of a folder rename or move, applied as one unit.
#[derive(Debug, Clone)]
pub struct Relocation {
    /// The folder being renamed or moved.
    pub folder_id: FolderId,
    /// New display name.
    pub name: String,
    /// New slug.
    pub slug: String,
    /// New parent.
    pub parent_id: FolderId,
    /// New prefix of every folder in the subtree, the relocated folder included.
    pub folder_prefixes: Vec<(FolderId, String)>,
    /// New object key of every file in the subtree.
    pub file_paths: Vec<(FileId, String)>,
    /// Aggregate move between ancestor chains; `None` for a rename.
    pub transfer: Option<AggregateTransfer>,
}

/// The metadata half of a single-file move.
#[derive(Debug, Clone)]
pub struct FileRelocation {
    /// The file being moved.
    pub file_id: FileId,
    /// Destination folder.
    pub folder_id: FolderId,
    /// New object key.
    pub s3_path: String,
    /// Aggregate move from the old chain to the new one.
    pub transfer: AggregateTransfer,
}

/// Folder and file persistence for the workspace engine.
///
/// Every mutating method is atomic: either all of its record and
/// aggregate changes are applied or none are. Ancestor chains are passed
/// as folder IDs, root first, ending with the folder that directly
/// contains the new or removed node.
#[async_trait]
pub trait TreeRepository: Send + Sync + Debug + 'static {
    /// Find a folder by ID.
    async fn find_folder(&self, id: FolderId) -> AppResult<Option<Folder>>;

    /// Find a file by ID.
    async fn find_file(&self, id: FileId) -> AppResult<Option<File>>;

    /// Find the root folder of a client.
    async fn find_root(&self, client_id: ClientId) -> AppResult<Option<Folder>>;

    /// Find the folders of one type in a client's tree, ordered by prefix.
    async fn find_by_type(
        &self,
        client_id: ClientId,
        folder_type: FolderType,
    ) -> AppResult<Vec<Folder>>;

    /// List the direct child folders of a folder, ordered by name.
    async fn list_child_folders(&self, parent_id: FolderId) -> AppResult<Vec<Folder>>;

    /// List the files directly in a folder, ordered by display name.
    async fn list_files(&self, folder_id: FolderId) -> AppResult<Vec<File>>;

    /// Slugs currently used by the children of `parent_id`.
    async fn sibling_slugs(&self, parent_id: FolderId) -> AppResult<Vec<String>>;

    /// The chain from the client root down to `folder_id`, both included.
    async fn find_ancestors(&self, folder_id: FolderId) -> AppResult<Vec<Folder>>;

    /// Load a folder, its descendants in pre-order, and all their files.
    async fn load_subtree(&self, folder_id: FolderId) -> AppResult<Subtree>;

    /// Insert a folder and add one folder to every folder in `ancestors`.
    async fn insert_folder(&self, folder: &NewFolder, ancestors: &[FolderId])
    -> AppResult<Folder>;

    /// Insert a file and add it to every folder in `ancestors`.
    async fn insert_file(&self, file: &NewFile, ancestors: &[FolderId]) -> AppResult<File>;

    /// Change a file's display name.
    async fn rename_file(&self, id: FileId, original_name: &str) -> AppResult<File>;

    /// Apply the metadata of a folder rename or move.
    async fn commit_relocation(&self, relocation: &Relocation) -> AppResult<Folder>;

    /// Apply the metadata of a file move.
    async fn relocate_file(&self, relocation: &FileRelocation) -> AppResult<File>;

    /// Remove a folder with all descendants and files, subtracting
    /// `removed` from every folder in `ancestors`.
    async fn delete_subtree(
        &self,
        folder_id: FolderId,
        ancestors: &[FolderId],
        removed: Aggregates,
    ) -> AppResult<()>;

    /// Remove a file record, subtracting it from every folder in `ancestors`.
    async fn delete_file(&self, file_id: FileId, ancestors: &[FolderId]) -> AppResult<()>;

    /// Overwrite stored aggregates. Returns the number of folders written.
    async fn store_aggregates(&self, values: &[(FolderId, Aggregates)]) -> AppResult<u64>;
}
