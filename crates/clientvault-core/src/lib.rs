//! # clientvault-core
//!
//! Core crate for ClientVault. Contains the object storage and audit traits,
//! configuration schemas, typed identifiers, workspace events, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other ClientVault crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
