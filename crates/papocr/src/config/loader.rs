use std::path::Path;

use crate::config::settings::OcrSettings;
use crate::error::ConfigError;

/// Reads settings from a JSON file. Absent fields keep their defaults.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<OcrSettings, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_settings_from_str(&content)
}

pub fn load_settings_from_str(content: &str) -> Result<OcrSettings, ConfigError> {
    let settings: OcrSettings = serde_json::from_str(content)?;
    Ok(settings)
}
