//! Loads `ProvisionConfig` from a YAML file on disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::ProvisionConfig;

/// Reads the provisioning config, expanding `~/` against `home`.
pub struct YamlConfigLoader {
    home: PathBuf,
}

impl YamlConfigLoader {
    #[must_use]
    pub fn new(home: PathBuf) -> Self {
        Self { home }
    }

    /// Loader rooted at the current user's home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn from_home_dir() -> Result<Self> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(Self::new(home))
    }

    /// `~/.charty/config.yaml`.
    #[must_use]
    pub fn default_path(&self) -> PathBuf {
        self.home.join(".charty").join("config.yaml")
    }

    /// Load the config.
    ///
    /// An `explicit` path (from `--config` or `CHARTY_CONFIG`) must exist.
    /// Without one, a missing default file yields the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or parsed, or if an explicit
    /// path does not exist.
    pub fn load(&self, explicit: Option<&Path>) -> Result<ProvisionConfig> {
        let config = match explicit {
            Some(path) => read(path)?,
            None => {
                let path = self.default_path();
                if path.exists() {
                    read(&path)?
                } else {
                    ProvisionConfig::default()
                }
            }
        };
        Ok(config.with_home(&self.home))
    }
}

fn read(path: &Path) -> Result<ProvisionConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(ProvisionConfig::default());
    }
    serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
}
