//! Folder domain entities.

pub mod aggregate;
pub mod kind;
pub mod model;
pub mod tree;

pub use aggregate::Aggregates;
pub use kind::FolderType;
pub use model::{Folder, NewFolder};
pub use tree::{Breadcrumb, FolderNode};
