use std::path::Path;

use crate::app::AppConfig;
use crate::error::ConfigLoadError;

impl AppConfig {
    /// Reads and parses a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&text).map_err(|source| ConfigLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`AppConfig::load`], but any failure is logged and replaced by
    /// the defaults (400x400, no shader).
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(cfg) => {
                log::info!("loaded config from {}", path.display());
                cfg
            }
            Err(err) => {
                log::warn!("{err}: {}; using defaults", source_message(&err));
                Self::default()
            }
        }
    }
}

fn source_message(err: &ConfigLoadError) -> String {
    match err {
        ConfigLoadError::Read { source, .. } => source.to_string(),
        ConfigLoadError::Parse { source, .. } => source.to_string(),
    }
}
