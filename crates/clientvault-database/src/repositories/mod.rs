//! Tree repository trait and its implementations.

pub mod memory;
pub mod postgres;
pub mod tree;

pub use memory::MemoryTreeRepository;
pub use postgres::PgTreeRepository;
pub use tree::{AggregateTransfer, FileRelocation, Relocation, Subtree, TreeRepository};
