//! # clientvault-service
//!
//! The workspace tree engine. [`WorkspaceService`] keeps the folder/file
//! metadata in the tree repository and the file bytes in the object store
//! consistent across create, rename, move, and delete. [`WorkspaceFacade`]
//! wraps it with the DTOs handed to transport layers.
//!
//! Services follow constructor injection: every dependency is provided at
//! construction time via `Arc` references.

pub mod audit;
pub mod context;
pub mod facade;
pub mod workspace;

pub use audit::{LogAuditSink, MemoryAuditSink};
pub use context::RequestContext;
pub use facade::WorkspaceFacade;
pub use workspace::{WorkspaceService, WorkspaceSettings};
