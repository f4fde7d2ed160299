//! Folder type taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of folder types and the nesting rules between them.
///
/// ```text
/// root ─► documents ─► years ─► year ─► folder ─► folder ...
///                  └─► folder        └─► year (archived years)
/// ```
///
/// `root`, `documents`, and `years` are seeded when a client is
/// provisioned and are never created, renamed, moved, or deleted by
/// workspace operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "folder_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FolderType {
    /// The client's root folder.
    Root,
    /// The fixed documents folder directly under root.
    Documents,
    /// The fixed container of year folders.
    Years,
    /// A fiscal/calendar year folder.
    Year,
    /// A user-created folder.
    Folder,
}

impl FolderType {
    /// Whether a folder of this type may directly contain a folder of type `child`.
    pub fn can_host(&self, child: FolderType) -> bool {
        matches!(
            (self, child),
            (Self::Root, Self::Documents)
                | (Self::Documents, Self::Years)
                | (Self::Documents, Self::Folder)
                | (Self::Years, Self::Year)
                | (Self::Year, Self::Folder)
                | (Self::Folder, Self::Folder)
                | (Self::Folder, Self::Year)
        )
    }

    /// Structural folders are part of the seeded skeleton of every client tree.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Root | Self::Documents | Self::Years)
    }

    /// Return the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Documents => "documents",
            Self::Years => "years",
            Self::Year => "year",
            Self::Folder => "folder",
        }
    }
}

impl fmt::Display for FolderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FolderType {
    type Err = clientvault_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "root" => Ok(Self::Root),
            "documents" => Ok(Self::Documents),
            "years" => Ok(Self::Years),
            "year" => Ok(Self::Year),
            "folder" => Ok(Self::Folder),
            _ => Err(clientvault_core::AppError::validation(format!(
                "Invalid folder type: '{s}'. Expected one of: root, documents, years, year, folder"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton_nesting() {
        assert!(FolderType::Root.can_host(FolderType::Documents));
        assert!(FolderType::Documents.can_host(FolderType::Years));
        assert!(FolderType::Years.can_host(FolderType::Year));
        assert!(!FolderType::Root.can_host(FolderType::Folder));
        assert!(!FolderType::Years.can_host(FolderType::Folder));
    }

    #[test]
    fn test_generic_nesting() {
        assert!(FolderType::Year.can_host(FolderType::Folder));
        assert!(FolderType::Folder.can_host(FolderType::Folder));
        assert!(FolderType::Folder.can_host(FolderType::Year));
        assert!(!FolderType::Year.can_host(FolderType::Year));
    }

    #[test]
    fn test_structural_types_are_never_hosted_by_generic_folders() {
        for structural in [FolderType::Root, FolderType::Documents, FolderType::Years] {
            assert!(structural.is_structural());
            assert!(!FolderType::Folder.can_host(structural));
            assert!(!FolderType::Year.can_host(structural));
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("YEAR".parse::<FolderType>().unwrap(), FolderType::Year);
        assert!("drawer".parse::<FolderType>().is_err());
    }
}
