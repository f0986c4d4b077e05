//! JSON file config adapter.
//!
//! Implements [`ConfigPort`] over a single JSON document.  A missing file
//! means "never configured" and loads the defaults; fields absent from
//! the document take their default values.  Writes go to a sibling temp
//! file first and are renamed into place, so a reader never sees a
//! half-written document.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::RoverConfig;

/// Environment variable naming the config file the binary loads.
pub const CONFIG_PATH_ENV: &str = "ROVER_CONTROL_CONFIG";

#[derive(Debug, Clone)]
pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<RoverConfig, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("config: {} not found, using defaults", self.path.display());
                return Ok(RoverConfig::default());
            }
            Err(e) => {
                warn!("config: read {} failed: {}", self.path.display(), e);
                return Err(ConfigError::IoError);
            }
        };

        let config: RoverConfig = serde_json::from_str(&text).map_err(|e| {
            warn!("config: {} is corrupted: {}", self.path.display(), e);
            ConfigError::Corrupted
        })?;
        config.validate().map_err(ConfigError::ValidationFailed)?;

        info!("config: loaded {}", self.path.display());
        Ok(config)
    }

    fn save(&self, config: &RoverConfig) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::ValidationFailed)?;

        let text = serde_json::to_string_pretty(config).map_err(|_| ConfigError::IoError)?;
        let tmp = self.temp_path();
        fs::write(&tmp, text).map_err(|e| {
            warn!("config: write {} failed: {}", tmp.display(), e);
            ConfigError::IoError
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            warn!("config: rename to {} failed: {}", self.path.display(), e);
            ConfigError::IoError
        })?;

        info!("config: saved {}", self.path.display());
        Ok(())
    }
}
