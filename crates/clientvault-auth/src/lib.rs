//! # clientvault-auth
//!
//! Authorization for workspace operations. Principals arrive already
//! authenticated; this crate only decides whether a principal may act
//! on a client's folders and files.
//!
//! ## Modules
//!
//! - `gate` — ownership and role checks for workspace actions
//! - `ownership` — the `ClientOwned` trait implemented by tree entities

pub mod gate;
pub mod ownership;

pub use gate::{AccessGate, WorkspaceAction};
pub use ownership::ClientOwned;
