//! JSON file configuration adapter.
//!
//! Implements [`ConfigPort`] over a single JSON document.  A missing file
//! means "use defaults"; anything unreadable or invalid is an error rather
//! than a silent fallback.  Fields absent from the document keep their
//! default values.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SequencerConfig;

pub struct JsonFileConfig {
    path: PathBuf,
}

impl JsonFileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigPort for JsonFileConfig {
    fn load(&self) -> Result<SequencerConfig, ConfigError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Config: {} not found, using defaults", self.path.display());
                return Ok(SequencerConfig::default());
            }
            Err(e) => {
                warn!("Config: cannot read {}: {}", self.path.display(), e);
                return Err(ConfigError::IoError);
            }
        };
        let config: SequencerConfig =
            serde_json::from_slice(&bytes).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        info!("Config: loaded {}", self.path.display());
        Ok(config)
    }

    fn save(&self, config: &SequencerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let json = serde_json::to_vec_pretty(config).map_err(|_| ConfigError::IoError)?;
        fs::write(&self.path, json).map_err(|_| ConfigError::IoError)
    }
}
