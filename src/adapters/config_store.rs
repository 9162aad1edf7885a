//! In-memory configuration store.
//!
//! Implements [`ConfigPort`].  The stored value is kept as a serialised
//! JSON blob, the same shape a flash-backed store would persist, so a
//! corrupted or hand-edited blob is caught on load.
//!
//! # Validation
//!
//! Every field is range-checked by [`DamperConfig::validate`] before the
//! blob is replaced.  A rejected save leaves the previous value intact.

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::DamperConfig;

#[derive(Debug, Default)]
pub struct ConfigStore {
    blob: Option<String>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a configuration (validated like any save).
    pub fn with_config(config: &DamperConfig) -> Result<Self, ConfigError> {
        let mut store = Self::new();
        store.save(config)?;
        Ok(store)
    }

    pub fn is_empty(&self) -> bool {
        self.blob.is_none()
    }

    /// Raw stored blob, for diagnostics.
    pub fn raw(&self) -> Option<&str> {
        self.blob.as_deref()
    }
}

impl ConfigPort for ConfigStore {
    fn load(&self) -> Result<DamperConfig, ConfigError> {
        let Some(blob) = self.blob.as_deref() else {
            info!("ConfigStore: no stored config, using defaults");
            return Ok(DamperConfig::default());
        };
        let cfg: DamperConfig = serde_json::from_str(blob)
            .map_err(|_| ConfigError::ValidationFailed("stored config is not valid JSON"))?;
        cfg.validate()?;
        info!("ConfigStore: loaded config ({} bytes)", blob.len());
        Ok(cfg)
    }

    fn save(&mut self, config: &DamperConfig) -> Result<(), ConfigError> {
        if let Err(e) = config.validate() {
            warn!("ConfigStore: rejected config: {}", e);
            return Err(e);
        }
        let blob = serde_json::to_string(config)
            .map_err(|_| ConfigError::ValidationFailed("config could not be serialised"))?;
        info!("ConfigStore: config saved ({} bytes)", blob.len());
        self.blob = Some(blob);
        Ok(())
    }
}
