//! Subtree migration: relocating every object below a folder whose prefix changes.
//!
//! Object stores cannot rename a directory, so a folder rename or move is
//! carried out one key at a time in three phases:
//!
//! 1. **copy** every object to its new key; any failure aborts before
//!    metadata changes,
//! 2. **commit** all new prefixes and paths in one repository transaction,
//! 3. **clean up** the old keys, best-effort.
//!
//! A failure in phase 1 leaves duplicates at the new keys, which are
//! unreferenced and safe to sweep. Metadata never points at a key whose
//! object was not copied. Re-running the same relocation repeats phase 1
//! harmlessly.

use tracing::{debug, warn};

use clientvault_core::error::{AppError, ErrorKind};
use clientvault_core::result::AppResult;
use clientvault_core::traits::ObjectStore;
use clientvault_core::types::id::{FileId, FolderId};
use clientvault_database::repositories::Subtree;

use super::path::rebase;

/// One object to relocate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMove {
    /// The file record the object belongs to.
    pub file_id: FileId,
    /// Display name, for error messages.
    pub original_name: String,
    /// Current key.
    pub from: String,
    /// Target key.
    pub to: String,
}

/// The full set of key rewrites for relocating one subtree.
#[derive(Debug, Clone, Default)]
pub struct MigrationPlan {
    /// New prefix of every folder in the subtree, pre-order.
    pub folder_prefixes: Vec<(FolderId, String)>,
    /// Object moves, one per file.
    pub moves: Vec<ObjectMove>,
}

impl MigrationPlan {
    /// Compute the rewrites that move `subtree` from `old_prefix` to `new_prefix`.
    pub fn build(subtree: &Subtree, old_prefix: &str, new_prefix: &str) -> AppResult<Self> {
        let folder_prefixes = subtree
            .folders
            .iter()
            .map(|f| Ok((f.id, rebase(&f.s3_prefix, old_prefix, new_prefix)?)))
            .collect::<AppResult<Vec<_>>>()?;

        let moves = subtree
            .files
            .iter()
            .map(|f| {
                Ok(ObjectMove {
                    file_id: f.id,
                    original_name: f.original_name.clone(),
                    from: f.s3_path.clone(),
                    to: rebase(&f.s3_path, old_prefix, new_prefix)?,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            folder_prefixes,
            moves,
        })
    }

    /// New object key of every file, for the metadata commit.
    pub fn file_paths(&self) -> Vec<(FileId, String)> {
        self.moves.iter().map(|m| (m.file_id, m.to.clone())).collect()
    }

    /// Number of objects being relocated.
    pub fn object_count(&self) -> u64 {
        self.moves.len() as u64
    }

    /// Copy every object to its new key, stopping at the first failure.
    pub async fn copy_all(&self, store: &dyn ObjectStore) -> AppResult<()> {
        for (index, object) in self.moves.iter().enumerate() {
            copy_object(store, object).await.map_err(|e| {
                warn!(
                    file_id = %object.file_id,
                    from = %object.from,
                    to = %object.to,
                    copied = index,
                    remaining = self.moves.len() - index,
                    error = %e,
                    "Subtree migration aborted"
                );
                e
            })?;
        }
        Ok(())
    }

    /// Delete every old key. Failures are logged and left as orphans.
    pub async fn remove_sources(&self, store: &dyn ObjectStore) -> usize {
        let mut failed = 0;
        for object in &self.moves {
            if let Err(e) = store.delete(&object.from).await {
                failed += 1;
                warn!(
                    file_id = %object.file_id,
                    key = %object.from,
                    error = %e,
                    "Failed to delete migrated object; leaving orphan"
                );
            }
        }
        failed
    }
}

/// Copy one object, treating "source gone, destination present" as
/// already migrated.
pub async fn copy_object(store: &dyn ObjectStore, object: &ObjectMove) -> AppResult<()> {
    match store.copy(&object.from, &object.to).await {
        Ok(()) => {
            debug!(from = %object.from, to = %object.to, "Copied object");
            Ok(())
        }
        Err(e) if e.is(ErrorKind::NotFound) => {
            if store.exists(&object.to).await? {
                debug!(key = %object.to, "Object already at destination");
                Ok(())
            } else {
                Err(AppError::storage(format!(
                    "File '{}' ({}) is missing from storage at '{}' and '{}'",
                    object.original_name, object.file_id, object.from, object.to
                )))
            }
        }
        Err(e) => Err(AppError::with_source(
            ErrorKind::Storage,
            format!(
                "Failed to copy file '{}' ({}) from '{}' to '{}'",
                object.original_name, object.file_id, object.from, object.to
            ),
            e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::Utc;
    use clientvault_core::types::id::{ClientId, UserId};
    use clientvault_entity::file::NewFile;
    use clientvault_entity::folder::{FolderType, NewFolder};
    use clientvault_storage::MemoryObjectStore;

    fn subtree() -> Subtree {
        let client_id = ClientId::new();
        let y2023 = NewFolder {
            id: FolderId::new(),
            client_id,
            parent_id: Some(FolderId::new()),
            name: "2023".into(),
            slug: "2023".into(),
            folder_type: FolderType::Year,
            s3_prefix: "clients/c1/documents/years/2023/".into(),
        }
        .into_folder(Utc::now());
        let q1 = NewFolder {
            id: FolderId::new(),
            client_id,
            parent_id: Some(y2023.id),
            name: "Q1".into(),
            slug: "q1".into(),
            folder_type: FolderType::Folder,
            s3_prefix: "clients/c1/documents/years/2023/q1/".into(),
        }
        .into_folder(Utc::now());
        let file = NewFile {
            id: FileId::new(),
            client_id,
            folder_id: q1.id,
            file_name: "abc123.pdf".into(),
            original_name: "invoice.pdf".into(),
            mime_type: "application/pdf".into(),
            size: 10,
            s3_path: "clients/c1/documents/years/2023/q1/abc123.pdf".into(),
            uploaded_by: UserId::new(),
        }
        .into_file(Utc::now());
        Subtree {
            folders: vec![y2023, q1],
            files: vec![file],
        }
    }

    #[test]
    fn test_plan_rewrites_every_prefix_and_key() {
        let plan = MigrationPlan::build(
            &subtree(),
            "clients/c1/documents/years/2023/",
            "clients/c1/documents/years/2023-final/",
        )
        .unwrap();
        let prefixes: Vec<&str> = plan.folder_prefixes.iter().map(|(_, p)| p.as_str()).collect();
        assert_eq!(
            prefixes,
            vec![
                "clients/c1/documents/years/2023-final/",
                "clients/c1/documents/years/2023-final/q1/"
            ]
        );
        assert_eq!(
            plan.moves[0].to,
            "clients/c1/documents/years/2023-final/q1/abc123.pdf"
        );
    }

    #[tokio::test]
    async fn test_copy_treats_completed_move_as_done() {
        let store = MemoryObjectStore::new();
        let object = ObjectMove {
            file_id: FileId::new(),
            original_name: "invoice.pdf".into(),
            from: "old/a.pdf".into(),
            to: "new/a.pdf".into(),
        };
        store.put("new/a.pdf", Bytes::from("a"), None).await.unwrap();
        copy_object(&store, &object).await.unwrap();

        store.delete("new/a.pdf").await.unwrap();
        let err = copy_object(&store, &object).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);
        assert!(err.message.contains("invoice.pdf"));
    }
}
