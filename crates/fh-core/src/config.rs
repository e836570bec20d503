//! Configuration management for fanhub

use crate::comment::{BuildOptions, OrphanPolicy, ReplyFallback};
use crate::error::{FanHubError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default location of the project configuration file
pub const DEFAULT_CONFIG_PATH: &str = ".fanhub/config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Comment handling settings
    pub comments: CommentsConfig,
    /// Storage settings
    pub storage: StorageConfig,
    /// Display settings
    pub display: DisplayConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| FanHubError::Io(e).with_context(format!("reading {}", path.display())))?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("No configuration at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Serialize to pretty TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.comments.max_length == 0 {
            return Err(FanHubError::Config(
                "comments.max_length must be greater than zero".to_string(),
            ));
        }
        if self.display.indent > 16 {
            return Err(FanHubError::Config(
                "display.indent must be at most 16".to_string(),
            ));
        }
        Ok(())
    }

    /// Forest build/mutation options derived from the comment settings
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            orphan_policy: self.comments.orphan_policy,
            reply_fallback: self.comments.reply_fallback,
        }
    }
}

/// Comment-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    /// Maximum comment text length in characters
    pub max_length: usize,
    /// What to do with comments whose parent is not loaded
    pub orphan_policy: OrphanPolicy,
    /// What to do with a reply whose parent is no longer in the thread
    pub reply_fallback: ReplyFallback,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            max_length: 2000,
            orphan_policy: OrphanPolicy::Promote,
            reply_fallback: ReplyFallback::PromoteToRoot,
        }
    }
}

/// Storage-related configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding post comment documents
    pub data_dir: Option<PathBuf>,
}

/// Display-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Default output format for listing threads
    pub default_format: String,
    /// Show "5 minutes ago" style timestamps
    pub relative_times: bool,
    /// Spaces per nesting level
    pub indent: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_format: "text".to_string(),
            relative_times: true,
            indent: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.comments.max_length, 2000);
        assert_eq!(config.comments.orphan_policy, OrphanPolicy::Promote);
        assert_eq!(config.comments.reply_fallback, ReplyFallback::PromoteToRoot);
        assert_eq!(config.display.default_format, "text");
        assert!(config.storage.data_dir.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = config.to_toml_string().unwrap();
        assert!(toml.contains("[comments]"));
        assert!(toml.contains("[display]"));
        assert!(toml.contains("reply_fallback = \"promote-to-root\""));

        let config2: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.display.indent, config2.display.indent);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[comments]
reply_fallback = "drop"
"#,
        )
        .unwrap();
        assert_eq!(config.comments.reply_fallback, ReplyFallback::Drop);
        assert_eq!(config.comments.max_length, 2000);
        assert!(config.display.relative_times);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.display.indent, 2);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[comments]\nmax_length = 0\n").unwrap();
        assert!(matches!(Config::load(&path), Err(FanHubError::Config(_))));

        fs::write(&path, "[comments\n").unwrap();
        assert!(matches!(Config::load(&path), Err(FanHubError::Toml(_))));
    }

    #[test]
    fn test_build_options() {
        let mut config = Config::default();
        config.comments.orphan_policy = OrphanPolicy::Drop;
        let options = config.build_options();
        assert_eq!(options.orphan_policy, OrphanPolicy::Drop);
        assert_eq!(options.reply_fallback, ReplyFallback::PromoteToRoot);
    }
}
