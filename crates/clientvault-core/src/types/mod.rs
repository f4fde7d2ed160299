//! Core type definitions used across the ClientVault workspace.

pub mod id;

pub use id::*;
