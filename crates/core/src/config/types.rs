use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::worker::WorkerConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Directory batches download into unless the caller overrides it.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("Downloads")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker: WorkerConfig::default(),
            download_dir: default_download_dir(),
        }
    }
}
