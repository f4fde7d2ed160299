//! # clientvault-storage
//!
//! Object store adapters for ClientVault. Supports the local filesystem,
//! S3-compatible object stores, and an in-memory store used by tests.
//! Every adapter implements [`ObjectStore`](clientvault_core::traits::ObjectStore).

pub mod builder;
pub mod providers;
pub mod signing;
pub mod timed;

pub use builder::build_object_store;
pub use providers::{LocalObjectStore, MemoryObjectStore};
pub use timed::TimedObjectStore;
