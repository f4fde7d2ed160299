//! Domain events emitted by workspace operations.
//!
//! Events are handed to an [`AuditSink`](crate::traits::AuditSink) after
//! each committed mutation.

pub mod workspace;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::id::{ClientId, UserId};

pub use workspace::WorkspaceEvent;

/// Wrapper for all domain events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The principal who caused the event.
    pub actor_id: Option<UserId>,
    /// The client whose workspace changed.
    pub client_id: ClientId,
    /// The event payload.
    pub payload: WorkspaceEvent,
}

impl DomainEvent {
    /// Create a new domain event.
    pub fn new(actor_id: Option<UserId>, client_id: ClientId, payload: WorkspaceEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            actor_id,
            client_id,
            payload,
        }
    }
}
