//! Resources that belong to exactly one client.

use clientvault_core::types::id::ClientId;
use clientvault_entity::file::File;
use clientvault_entity::folder::Folder;

/// A resource stamped with its owning client.
///
/// Every folder and file carries the client ID directly, so ownership
/// checks never walk the tree.
pub trait ClientOwned {
    /// The client owning this resource.
    fn owner(&self) -> ClientId;
}

impl ClientOwned for Folder {
    fn owner(&self) -> ClientId {
        self.client_id
    }
}

impl ClientOwned for File {
    fn owner(&self) -> ClientId {
        self.client_id
    }
}

impl ClientOwned for ClientId {
    fn owner(&self) -> ClientId {
        *self
    }
}
