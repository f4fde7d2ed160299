//! Audit sinks for workspace events.

use std::sync::Mutex;

use tracing::info;

use clientvault_core::events::DomainEvent;
use clientvault_core::traits::AuditSink;

/// Writes every event to the log.
#[derive(Debug, Clone, Default)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn record(&self, event: DomainEvent) {
        let details = serde_json::to_string(&event.payload).unwrap_or_default();
        info!(
            event_id = %event.id,
            event = event.payload.name(),
            client_id = %event.client_id,
            actor_id = ?event.actor_id,
            %details,
            "Workspace event"
        );
    }
}

/// Keeps events in memory, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded so far, oldest first.
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// The names of all recorded events, oldest first.
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.payload.name()).collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: DomainEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
