//! Access gate: decides whether a principal may act on a client's tree.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use clientvault_core::error::AppError;
use clientvault_entity::user::Principal;

use crate::ownership::ClientOwned;

/// What a caller wants to do with a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceAction {
    /// Browse folders or download files.
    View,
    /// Create, rename, move, upload, or delete.
    Modify,
    /// Provision trees and repair aggregates.
    Administer,
}

impl fmt::Display for WorkspaceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::View => write!(f, "view"),
            Self::Modify => write!(f, "modify"),
            Self::Administer => write!(f, "administer"),
        }
    }
}

/// Enforces client ownership on workspace resources.
///
/// Admins may do anything. Client principals may view and modify the
/// resources of their own client and nothing else, and may never
/// administer.
#[derive(Debug, Clone, Default)]
pub struct AccessGate;

impl AccessGate {
    /// Creates a new gate.
    pub fn new() -> Self {
        Self
    }

    /// Checks access without producing an error.
    pub fn can_access<R: ClientOwned + ?Sized>(
        &self,
        principal: &Principal,
        resource: &R,
        action: WorkspaceAction,
    ) -> bool {
        if principal.is_admin() {
            return true;
        }
        if action == WorkspaceAction::Administer {
            return false;
        }
        principal.client_id == Some(resource.owner())
    }

    /// Returns `Ok(())` if allowed, or a `Forbidden` error if denied.
    pub fn require<R: ClientOwned + ?Sized>(
        &self,
        principal: &Principal,
        resource: &R,
        action: WorkspaceAction,
    ) -> Result<(), AppError> {
        if self.can_access(principal, resource, action) {
            Ok(())
        } else {
            debug!(
                principal_id = %principal.id,
                role = %principal.role,
                owner = %resource.owner(),
                %action,
                "Workspace access denied"
            );
            Err(AppError::forbidden(format!(
                "Not allowed to {action} resources of this client"
            )))
        }
    }

    /// Requires an admin principal regardless of resource.
    pub fn require_admin(&self, principal: &Principal) -> Result<(), AppError> {
        if principal.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("This operation requires an admin"))
        }
    }
}
