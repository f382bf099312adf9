pub mod loader;
pub mod provider;
pub mod record;
pub mod resolve;
pub mod schema;
pub mod settings;

pub use loader::{load_settings, load_settings_from_str};
pub use provider::{DatabaseConfigProvider, OcrConfigProvider, StaticConfigProvider};
pub use record::ApplicationConfiguration;
pub use resolve::{resolve, OcrConfig, OcrOverrides};
pub use schema::{CleanMode, ColorConversionStrategy, OcrMode, OutputType, SkipArchiveFile};
pub use settings::OcrSettings;
