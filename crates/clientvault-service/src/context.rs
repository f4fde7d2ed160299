//! Request context carrying the already-authenticated principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clientvault_core::types::id::UserId;
use clientvault_entity::user::Principal;

/// Context for the current request.
///
/// Built by the transport layer from its authenticated session and passed
/// into every service method so that each operation knows who is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting principal.
    pub principal: Principal,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            request_time: Utc::now(),
        }
    }

    /// The acting principal's ID.
    pub fn user_id(&self) -> UserId {
        self.principal.id
    }

    /// Returns whether the current principal is an admin.
    pub fn is_admin(&self) -> bool {
        self.principal.is_admin()
    }
}
