use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Serialize, Deserialize};

use crate::config::tool_paths::ToolPaths;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PipelineConfig {
    #[serde(default)]
    pub tools: ToolPaths,
    /// Fixed location where mount-and-copy extraction mounts images
    #[serde(default = "default_mount_point")]
    pub mount_point: PathBuf,
    /// Upper bound for a single tool run, 0 for no limit
    #[serde(default)]
    pub tool_timeout_secs: u64,
    /// Extensions (without dot, case-insensitive) that identify a disk image
    #[serde(default = "default_disk_image_extensions")]
    pub disk_image_extensions: Vec<String>,
    #[serde(default = "default_junk_files")]
    pub junk_files: Vec<String>,
    #[serde(default = "default_junk_directories")]
    pub junk_directories: Vec<String>,
    /// Top-level names that mark optical video content
    #[serde(default = "default_video_markers")]
    pub video_markers: Vec<String>,
    /// Keep the disk image alongside extracted files instead of deleting it
    #[serde(default)]
    pub keep_image: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tools: ToolPaths::default(),
            mount_point: default_mount_point(),
            tool_timeout_secs: 0,
            disk_image_extensions: default_disk_image_extensions(),
            junk_files: default_junk_files(),
            junk_directories: default_junk_directories(),
            video_markers: default_video_markers(),
            keep_image: false,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: PipelineConfig = serde_yaml::from_str(&content)
            .context("Failed to parse YAML config")?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save_to_yaml_file(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)
            .context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .context(format!("Failed to write config to {}", path.display()))?;

        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Create a default configuration YAML file
    pub fn create_default_config_file(path: &Path) -> Result<()> {
        PipelineConfig::default().save_to_yaml_file(path)
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        if self.tool_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.tool_timeout_secs))
        }
    }

    /// Whether a file name carries one of the disk image extensions
    pub fn is_disk_image_name(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.disk_image_extensions
            .iter()
            .any(|ext| lower.ends_with(&format!(".{}", ext.trim_start_matches('.').to_lowercase())))
    }
}

/// Load a configuration file or create a default one.
///
/// An existing file at `config_path` is parsed. A path that does not exist
/// yet receives the defaults so they can be edited for the next run. With no
/// path, the built-in defaults are used.
pub fn load_or_create_config(config_path: Option<&Path>) -> Result<PipelineConfig> {
    match config_path {
        Some(path) if path.exists() => PipelineConfig::from_yaml_file(path),
        Some(path) => {
            info!("Creating default config at {}", path.display());
            let default_config = PipelineConfig::default();
            default_config.save_to_yaml_file(path)?;
            Ok(default_config)
        }
        None => {
            info!("No config path provided, using default configuration");
            Ok(PipelineConfig::default())
        }
    }
}

fn default_mount_point() -> PathBuf {
    PathBuf::from("/mnt/diskid/")
}

fn default_disk_image_extensions() -> Vec<String> {
    vec!["iso".to_string()]
}

fn default_junk_files() -> Vec<String> {
    ["Thumbs.db", ".DS_Store", "Desktop DB", "Desktop DF"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_junk_directories() -> Vec<String> {
    [".Trashes", ".Spotlight-V100", ".fseventsd"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_video_markers() -> Vec<String> {
    vec!["VIDEO_TS".to_string(), "AUDIO_TS".to_string()]
}
