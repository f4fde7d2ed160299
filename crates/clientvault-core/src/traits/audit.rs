//! Audit sink trait for fire-and-forget activity events.

use crate::events::DomainEvent;

/// Receives one event per committed workspace mutation.
///
/// Recording must never fail the operation that produced the event, so
/// the method has no return value. Persistence of the activity log lives
/// outside this workspace.
pub trait AuditSink: Send + Sync + std::fmt::Debug + 'static {
    /// Record an event.
    fn record(&self, event: DomainEvent);
}
