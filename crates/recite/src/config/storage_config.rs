use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Storage location configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory override (None = platform default).
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}
