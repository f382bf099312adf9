//! Sources of the effective OCR configuration.
//!
//! The parser asks a provider for a fresh snapshot on every parse, which
//! lets tests and embedders swap out the database without patching.

use crate::config::record::ApplicationConfiguration;
use crate::config::resolve::{resolve, OcrConfig, OcrOverrides};
use crate::config::settings::OcrSettings;
use crate::db::{config_repo, Database};
use crate::error::ConfigError;

pub trait OcrConfigProvider: Send + Sync {
    fn ocr_config(&self) -> Result<OcrConfig, ConfigError>;
}

/// Settings and overrides only; never touches a database.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    settings: OcrSettings,
    overrides: OcrOverrides,
}

impl StaticConfigProvider {
    pub fn new(settings: OcrSettings) -> Self {
        Self {
            settings,
            overrides: OcrOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: OcrOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn settings(&self) -> &OcrSettings {
        &self.settings
    }
}

impl OcrConfigProvider for StaticConfigProvider {
    fn ocr_config(&self) -> Result<OcrConfig, ConfigError> {
        Ok(resolve(&self.settings, None, &self.overrides))
    }
}

/// Settings, then the first persisted configuration record, then overrides.
#[derive(Clone)]
pub struct DatabaseConfigProvider {
    db: Database,
    settings: OcrSettings,
    overrides: OcrOverrides,
}

impl DatabaseConfigProvider {
    pub fn new(db: Database, settings: OcrSettings) -> Self {
        Self {
            db,
            settings,
            overrides: OcrOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: OcrOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn record(&self) -> Result<Option<ApplicationConfiguration>, ConfigError> {
        config_repo::find_first(&self.db).map_err(|e| ConfigError::Database(e.to_string()))
    }
}

impl OcrConfigProvider for DatabaseConfigProvider {
    fn ocr_config(&self) -> Result<OcrConfig, ConfigError> {
        let record = self.record()?;
        if record.is_none() {
            tracing::debug!("No persisted configuration record, using settings");
        }
        Ok(resolve(&self.settings, record.as_ref(), &self.overrides))
    }
}
