//! Configuration for the worker module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the yt-dlp worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_binary_path")]
    pub binary_path: PathBuf,

    /// Maximum video height to select; best video at or below this height is
    /// combined with best audio.
    #[serde(default = "default_max_height")]
    pub max_height: u32,

    /// Container format passed to `--merge-output-format`.
    #[serde(default = "default_merge_format")]
    pub merge_output_format: String,

    /// Output naming template, joined onto the job's target directory.
    #[serde(default = "default_output_template")]
    pub output_template: String,

    /// Additional arguments appended to every invocation.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_binary_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_max_height() -> u32 {
    2160
}

fn default_merge_format() -> String {
    "mp4".to_string()
}

fn default_output_template() -> String {
    "%(title)s.%(ext)s".to_string()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            binary_path: default_binary_path(),
            max_height: default_max_height(),
            merge_output_format: default_merge_format(),
            output_template: default_output_template(),
            extra_args: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.binary_path, PathBuf::from("yt-dlp"));
        assert_eq!(config.max_height, 2160);
        assert_eq!(config.merge_output_format, "mp4");
        assert_eq!(config.output_template, "%(title)s.%(ext)s");
        assert!(config.extra_args.is_empty());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: WorkerConfig = toml::from_str("max_height = 1080").unwrap();
        assert_eq!(config.max_height, 1080);
        assert_eq!(config.merge_output_format, "mp4");
    }
}
