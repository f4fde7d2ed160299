//! Convenience result type alias for ClientVault.

use crate::error::AppError;

/// A specialized `Result` type for ClientVault operations.
pub type AppResult<T> = Result<T, AppError>;
