//! Workspace engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the workspace tree engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// How long a mutating call waits for the per-client lock.
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout_seconds: u64,
    /// Maximum accepted upload size in bytes (default 100 MB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
}

impl WorkspaceConfig {
    /// Lock acquisition timeout as a [`Duration`].
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_seconds)
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            lock_timeout_seconds: default_lock_timeout(),
            max_upload_size_bytes: default_max_upload(),
        }
    }
}

fn default_lock_timeout() -> u64 {
    30
}

fn default_max_upload() -> u64 {
    104_857_600 // 100 MB
}
