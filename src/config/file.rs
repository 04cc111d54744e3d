//! Configuration file management
//!
//! Handles finding, loading, and validating configuration files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::profile::RunProfile;
use super::AppConfig;
use crate::models::Verbosity;

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./skipaware.yaml",
    "./skipaware.yml",
    "./.skipaware.yaml",
    "./.skipaware/config.yaml",
    "~/.config/skipaware/config.yaml",
    "~/.skipaware.yaml",
];

/// Full configuration file structure
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Version of config file format
    #[serde(default = "default_version")]
    pub version: String,

    /// Application settings
    #[serde(default)]
    pub app: AppConfig,

    /// Named run profiles
    #[serde(default)]
    pub profiles: Vec<RunProfile>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            app: AppConfig::default(),
            profiles: Vec::new(),
        }
    }
}

impl ConfigFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find configuration file in standard locations
    pub fn find() -> Option<PathBuf> {
        CONFIG_LOCATIONS
            .iter()
            .map(|location| expand_path(location))
            .find(|path| path.exists())
    }

    /// Load configuration from default location
    pub fn load_default() -> Result<Self> {
        match Self::find() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !["1.0", "1.1"].contains(&self.version.as_str()) {
            anyhow::bail!("Unsupported config version: {}", self.version);
        }

        if crate::output::OutputFormat::from_str(&self.app.format).is_none() {
            anyhow::bail!("Unknown report format: {}", self.app.format);
        }

        for (index, profile) in self.profiles.iter().enumerate() {
            if self.profiles[..index].iter().any(|p| p.name == profile.name) {
                anyhow::bail!("Duplicate profile '{}'", profile.name);
            }
            profile
                .validate()
                .with_context(|| format!("Invalid tag expression in profile '{}'", profile.name))?;
        }

        Ok(())
    }

    /// Generate example configuration
    pub fn example() -> Self {
        let mut app = AppConfig {
            verbosity: Verbosity::Normal,
            exit_first: false,
            ..Default::default()
        };
        app.options
            .insert("fixtures".to_string(), "data/fixtures".to_string());

        Self {
            version: "1.0".to_string(),
            app,
            profiles: vec![
                RunProfile::ci(),
                RunProfile::debug(),
                RunProfile {
                    description: "Database cases only".to_string(),
                    tag_match: Some("db and not slow".to_string()),
                    ..RunProfile::new("db")
                },
            ],
        }
    }

    /// Profile by name; built-in profiles are consulted last
    pub fn profile(&self, name: &str) -> Option<RunProfile> {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .or_else(|| RunProfile::builtin().into_iter().find(|p| p.name == name))
    }

    /// Names of every profile available, file profiles first
    pub fn profile_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.profiles.iter().map(|p| p.name.clone()).collect();
        for builtin in RunProfile::builtin() {
            if !names.contains(&builtin.name) {
                names.push(builtin.name);
            }
        }
        names
    }
}

/// Expand ~ to home directory
pub(crate) fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Check if file is YAML based on extension
pub(crate) fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}
