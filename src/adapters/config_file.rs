//! JSON configuration file adapter.
//!
//! A missing file yields the defaults; a file that exists but fails to
//! parse or validate is an error, so a typo never silently runs the
//! vivarium on default temperatures.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::ConfigPort;
use crate::config::SystemConfig;
use crate::error::ConfigError;

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
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                let cfg = SystemConfig::from_json(&text)?;
                info!("Config: loaded {}", self.path.display());
                Ok(cfg)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Config: {} not found, using defaults", self.path.display());
                Ok(SystemConfig::default())
            }
            Err(e) => Err(ConfigError::Io(format!("{}: {}", self.path.display(), e))),
        }
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let json =
            serde_json::to_string_pretty(config).map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(&self.path, json)
            .map_err(|e| ConfigError::Io(format!("{}: {}", self.path.display(), e)))?;
        info!("Config: saved {}", self.path.display());
        Ok(())
    }
}
