use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::schema::{
    CleanMode, ColorConversionStrategy, OcrMode, OutputType, SkipArchiveFile,
};

/// The persisted application configuration row.
///
/// Every field is optional; `None` (and for most fields a zero or empty
/// value) means "use the static setting". This crate only ever reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfiguration {
    pub id: Option<i64>,
    pub pages: Option<u32>,
    pub language: Option<String>,
    pub output_type: Option<OutputType>,
    pub mode: Option<OcrMode>,
    pub skip_archive_file: Option<SkipArchiveFile>,
    pub image_dpi: Option<u32>,
    pub unpaper_clean: Option<CleanMode>,
    pub deskew: Option<bool>,
    pub rotate_pages: Option<bool>,
    pub rotate_pages_threshold: Option<f64>,
    pub max_image_pixels: Option<f64>,
    pub color_conversion_strategy: Option<ColorConversionStrategy>,
    pub user_args: Option<Map<String, Value>>,
}
