//! Authenticated principal supplied by the (external) auth layer.

use serde::{Deserialize, Serialize};

use clientvault_core::types::id::{ClientId, UserId};

use super::role::UserRole;

/// An already-authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Principal identifier.
    pub id: UserId,
    /// Role at authentication time.
    pub role: UserRole,
    /// The client a `Client` principal belongs to; `None` for staff.
    pub client_id: Option<ClientId>,
}

impl Principal {
    /// Build an admin principal.
    pub fn admin(id: UserId) -> Self {
        Self {
            id,
            role: UserRole::Admin,
            client_id: None,
        }
    }

    /// Build a client principal bound to `client_id`.
    pub fn client(id: UserId, client_id: ClientId) -> Self {
        Self {
            id,
            role: UserRole::Client,
            client_id: Some(client_id),
        }
    }

    /// Returns whether the principal is an admin.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
