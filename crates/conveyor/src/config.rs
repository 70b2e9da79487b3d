//! Bundler configuration
//!
//! Configuration comes from a `conveyor.toml` file, discovered by walking the
//! ancestors of the entry asset's directory and falling back to the user
//! config directory. Command-line flags are merged on top by the CLI.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use etcetera::BaseStrategy;
use log::debug;
use serde::{Deserialize, Serialize};

/// Name of the configuration file searched for in ancestor directories
pub const CONFIG_FILE_NAME: &str = "conveyor.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directories searched, in order, when resolving logical references
    pub load_paths: Vec<PathBuf>,

    /// File extensions tried, in order, when a reference omits one
    pub extensions: Vec<String>,

    /// Where to write the bundle; stdout when unset
    pub output: Option<PathBuf>,

    /// Append a content digest to the output file name
    pub digest: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            load_paths: Vec::new(),
            extensions: vec!["js".into()],
            output: None,
            digest: false,
        }
    }
}

impl Config {
    /// Load configuration from a specific TOML file.
    ///
    /// Relative load paths are resolved against the config file's directory,
    /// so a checked-in config behaves the same from any working directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        if let Some(base) = path.parent() {
            for load_path in &mut config.load_paths {
                if load_path.is_relative() {
                    *load_path = base.join(&*load_path);
                }
            }
        }

        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Discover and load configuration for an entry under `start_dir`.
    ///
    /// Ancestor directories are searched first (nearest wins), then the user
    /// config directory. Returns the default configuration when no file is
    /// found.
    pub fn discover(start_dir: &Path) -> Result<Self> {
        for ancestor in start_dir.ancestors() {
            let candidate = ancestor.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Self::load(&candidate);
            }
        }

        if let Ok(strategy) = etcetera::choose_base_strategy() {
            let candidate = strategy.config_dir().join("conveyor").join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Self::load(&candidate);
            }
        }

        debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// Check whether `extension` is one of the configured asset extensions
    pub fn matches_extension(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn default_extension_is_js() {
        let config = Config::default();
        assert_eq!(config.extensions, vec!["js".to_owned()]);
        assert!(config.matches_extension("js"));
        assert!(!config.matches_extension("css"));
    }

    #[test]
    fn relative_load_paths_resolve_against_config_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &config_path,
            "load_paths = [\"vendor/assets/javascripts\", \"/opt/shared\"]\n",
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(
            config.load_paths,
            vec![
                temp_dir.path().join("vendor/assets/javascripts"),
                PathBuf::from("/opt/shared"),
            ]
        );
    }

    #[test]
    fn discover_prefers_nearest_ancestor() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("app/assets");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "extensions = [\"js\", \"coffee\"]\n",
        )
        .unwrap();

        let config = Config::discover(&nested).unwrap();
        assert_eq!(config.extensions, vec!["js".to_owned(), "coffee".to_owned()]);
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "load_path = [\"vendor\"]\n").unwrap();

        let err = Config::load(&config_path).unwrap_err();
        assert!(err.to_string().contains("failed to parse config file"));
    }
}
