//! Tree invariant checks.
//!
//! [`check_tree`] recomputes what every folder and file record should
//! look like from its ancestry and compares it with what is stored.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use clientvault_core::types::id::{ClientId, FileId, FolderId};
use clientvault_database::repositories::Subtree;
use clientvault_entity::folder::Aggregates;

use super::path;

/// One broken invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A folder prefix does not follow from its parent's prefix and its slug.
    PrefixMismatch {
        folder_id: FolderId,
        expected: String,
        actual: String,
    },
    /// A file key does not equal its folder prefix plus its file name.
    PathMismatch {
        file_id: FileId,
        expected: String,
        actual: String,
    },
    /// Two siblings share a slug.
    DuplicateSlug { parent_id: FolderId, slug: String },
    /// A folder belongs to another client than the tree root.
    ForeignFolder { folder_id: FolderId, client_id: ClientId },
    /// A file belongs to another client than the tree root.
    ForeignFile { file_id: FileId, client_id: ClientId },
    /// Stored aggregates differ from the live totals.
    AggregateMismatch {
        folder_id: FolderId,
        expected: Aggregates,
        actual: Aggregates,
    },
    /// A file record points at a key with no object behind it.
    MissingObject { file_id: FileId, key: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrefixMismatch {
                folder_id,
                expected,
                actual,
            } => write!(
                f,
                "folder {folder_id}: prefix is '{actual}', expected '{expected}'"
            ),
            Self::PathMismatch {
                file_id,
                expected,
                actual,
            } => write!(f, "file {file_id}: key is '{actual}', expected '{expected}'"),
            Self::DuplicateSlug { parent_id, slug } => {
                write!(f, "folder {parent_id}: slug '{slug}' used more than once")
            }
            Self::ForeignFolder {
                folder_id,
                client_id,
            } => write!(f, "folder {folder_id} belongs to client {client_id}"),
            Self::ForeignFile { file_id, client_id } => {
                write!(f, "file {file_id} belongs to client {client_id}")
            }
            Self::AggregateMismatch {
                folder_id,
                expected,
                actual,
            } => write!(
                f,
                "folder {folder_id}: aggregates {}/{}/{} (folders/files/bytes), expected {}/{}/{}",
                actual.folders,
                actual.files,
                actual.bytes,
                expected.folders,
                expected.files,
                expected.bytes
            ),
            Self::MissingObject { file_id, key } => {
                write!(f, "file {file_id}: no object at '{key}'")
            }
        }
    }
}

/// Result of verifying one client's tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeReport {
    /// The client that was checked.
    pub client_id: ClientId,
    /// Folders examined, the root included.
    pub folders: usize,
    /// Files examined.
    pub files: usize,
    /// Every broken invariant found.
    pub violations: Vec<Violation>,
}

impl TreeReport {
    /// Whether the tree passed every check.
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Live subtree totals of every folder, computed from the records.
pub fn expected_aggregates(subtree: &Subtree) -> HashMap<FolderId, Aggregates> {
    let mut totals: HashMap<FolderId, Aggregates> = subtree
        .folders
        .iter()
        .map(|f| (f.id, Aggregates::default()))
        .collect();

    for file in &subtree.files {
        if let Some(total) = totals.get_mut(&file.folder_id) {
            *total += Aggregates::one_file(file.size);
        }
    }

    // Pre-order puts every child after its parent, so walking backwards
    // finishes each folder before it is added to its parent.
    for folder in subtree.folders.iter().skip(1).rev() {
        let Some(parent_id) = folder.parent_id else {
            continue;
        };
        let own = totals.get(&folder.id).copied().unwrap_or_default();
        if let Some(parent) = totals.get_mut(&parent_id) {
            *parent += own + Aggregates::one_folder();
        }
    }
    totals
}

/// Check the record-level invariants of a whole client tree.
///
/// `subtree` must start at the client root, whose prefix is `root_prefix`.
pub fn check_tree(subtree: &Subtree, client_id: ClientId, root_prefix: &str) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut prefixes: HashMap<FolderId, &str> = HashMap::new();
    let mut slugs: HashSet<(FolderId, &str)> = HashSet::new();

    for (index, folder) in subtree.folders.iter().enumerate() {
        if folder.client_id != client_id {
            violations.push(Violation::ForeignFolder {
                folder_id: folder.id,
                client_id: folder.client_id,
            });
        }

        let expected = if index == 0 {
            Some(root_prefix.to_string())
        } else {
            folder
                .parent_id
                .and_then(|parent_id| prefixes.get(&parent_id))
                .map(|parent_prefix| path::child_prefix(parent_prefix, &folder.slug))
        };
        if let Some(expected) = expected.filter(|p| *p != folder.s3_prefix) {
            violations.push(Violation::PrefixMismatch {
                folder_id: folder.id,
                expected,
                actual: folder.s3_prefix.clone(),
            });
        }
        prefixes.insert(folder.id, &folder.s3_prefix);

        if let (Some(parent_id), true) = (folder.parent_id, index > 0) {
            if !slugs.insert((parent_id, folder.slug.as_str())) {
                violations.push(Violation::DuplicateSlug {
                    parent_id,
                    slug: folder.slug.clone(),
                });
            }
        }
    }

    for file in &subtree.files {
        if file.client_id != client_id {
            violations.push(Violation::ForeignFile {
                file_id: file.id,
                client_id: file.client_id,
            });
        }
        if let Some(prefix) = prefixes.get(&file.folder_id) {
            let expected = path::key_of(prefix, &file.file_name);
            if expected != file.s3_path {
                violations.push(Violation::PathMismatch {
                    file_id: file.id,
                    expected,
                    actual: file.s3_path.clone(),
                });
            }
        }
    }

    let totals = expected_aggregates(subtree);
    for folder in &subtree.folders {
        let expected = totals.get(&folder.id).copied().unwrap_or_default();
        if expected != folder.aggregates() {
            violations.push(Violation::AggregateMismatch {
                folder_id: folder.id,
                expected,
                actual: folder.aggregates(),
            });
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clientvault_core::types::id::UserId;
    use clientvault_entity::file::{File, NewFile};
    use clientvault_entity::folder::{Folder, FolderType, NewFolder};

    fn folder(client_id: ClientId, parent: Option<&Folder>, slug: &str, kind: FolderType) -> Folder {
        let s3_prefix = match parent {
            Some(p) => path::child_prefix(&p.s3_prefix, slug),
            None => path::root_prefix("clients", client_id),
        };
        NewFolder {
            id: FolderId::new(),
            client_id,
            parent_id: parent.map(|p| p.id),
            name: slug.to_string(),
            slug: slug.to_string(),
            folder_type: kind,
            s3_prefix,
        }
        .into_folder(Utc::now())
    }

    fn file(folder: &Folder, size: i64) -> File {
        NewFile {
            id: FileId::new(),
            client_id: folder.client_id,
            folder_id: folder.id,
            file_name: "abc.pdf".into(),
            original_name: "a.pdf".into(),
            mime_type: "application/pdf".into(),
            size,
            s3_path: path::key_of(&folder.s3_prefix, "abc.pdf"),
            uploaded_by: UserId::new(),
        }
        .into_file(Utc::now())
    }

    /// root > documents > years > 2023, one 100-byte file in 2023.
    fn tree() -> (ClientId, Subtree) {
        let client_id = ClientId::new();
        let mut root = folder(client_id, None, "", FolderType::Root);
        let mut docs = folder(client_id, Some(&root), "documents", FolderType::Documents);
        let mut years = folder(client_id, Some(&docs), "years", FolderType::Years);
        let y2023 = folder(client_id, Some(&years), "2023", FolderType::Year);
        let f = file(&y2023, 100);

        let mut y2023 = y2023;
        y2023.file_count = 1;
        y2023.total_size = 100;
        years.folder_count = 1;
        years.file_count = 1;
        years.total_size = 100;
        docs.folder_count = 2;
        docs.file_count = 1;
        docs.total_size = 100;
        root.folder_count = 3;
        root.file_count = 1;
        root.total_size = 100;

        (
            client_id,
            Subtree {
                folders: vec![root, docs, years, y2023],
                files: vec![f],
            },
        )
    }

    #[test]
    fn test_consistent_tree_has_no_violations() {
        let (client_id, subtree) = tree();
        let violations = check_tree(&subtree, client_id, &path::root_prefix("clients", client_id));
        assert!(violations.is_empty(), "{violations:?}");
    }

    #[test]
    fn test_expected_aggregates_are_subtree_totals() {
        let (_, subtree) = tree();
        let totals = expected_aggregates(&subtree);
        let root = &subtree.folders[0];
        assert_eq!(
            totals[&root.id],
            Aggregates {
                folders: 3,
                files: 1,
                bytes: 100
            }
        );
    }

    #[test]
    fn test_detects_corruption() {
        let (client_id, mut subtree) = tree();
        subtree.folders[2].file_count = 7;
        subtree.folders[3].s3_prefix = "clients/elsewhere/".into();
        subtree.files[0].s3_path = "clients/x.pdf".into();

        let violations = check_tree(&subtree, client_id, &path::root_prefix("clients", client_id));
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::AggregateMismatch { .. })));
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::PrefixMismatch { .. })));
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::PathMismatch { .. })));
    }
}
