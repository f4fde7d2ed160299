//! Core traits defined in `clientvault-core` and implemented by other crates.

pub mod audit;
pub mod storage;

pub use audit::AuditSink;
pub use storage::{Disposition, ObjectStore};
