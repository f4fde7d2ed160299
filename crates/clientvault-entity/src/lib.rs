//! # clientvault-entity
//!
//! Workspace entity models for ClientVault. Every struct in this crate
//! represents a database table row or a domain value object. Database
//! entities additionally derive `sqlx::FromRow`.

pub mod file;
pub mod folder;
pub mod user;
