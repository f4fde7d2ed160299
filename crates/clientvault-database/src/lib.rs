//! # clientvault-database
//!
//! PostgreSQL connection management and the tree repository used by the
//! workspace engine, plus an in-memory arena implementation of the same
//! repository for tests and local tooling.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{MemoryTreeRepository, PgTreeRepository, TreeRepository};
