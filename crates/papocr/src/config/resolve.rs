//! Field-by-field merge of the three configuration layers.
//!
//! Precedence: per-call override > persisted record > static setting.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::record::ApplicationConfiguration;
use crate::config::schema::{
    CleanMode, ColorConversionStrategy, OcrMode, OutputType, SkipArchiveFile,
};
use crate::config::settings::OcrSettings;

/// Effective OCR configuration for one parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrConfig {
    pub pages: Option<u32>,
    pub language: String,
    pub output_type: OutputType,
    pub mode: OcrMode,
    pub skip_archive_file: SkipArchiveFile,
    pub image_dpi: Option<u32>,
    pub clean: CleanMode,
    pub deskew: bool,
    pub rotate: bool,
    pub rotate_threshold: f64,
    pub max_image_pixels: Option<f64>,
    pub color_conversion_strategy: ColorConversionStrategy,
    pub user_args: Option<Map<String, Value>>,
    pub threads: usize,
}

/// Per-call overrides. `Some` always wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrOverrides {
    pub pages: Option<u32>,
    pub language: Option<String>,
    pub output_type: Option<OutputType>,
    pub mode: Option<OcrMode>,
    pub skip_archive_file: Option<SkipArchiveFile>,
    pub image_dpi: Option<u32>,
    pub clean: Option<CleanMode>,
    pub deskew: Option<bool>,
    pub rotate: Option<bool>,
    pub rotate_threshold: Option<f64>,
    pub max_image_pixels: Option<f64>,
    pub color_conversion_strategy: Option<ColorConversionStrategy>,
    pub user_args: Option<Map<String, Value>>,
}

impl OcrOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub fn resolve(
    settings: &OcrSettings,
    record: Option<&ApplicationConfiguration>,
    overrides: &OcrOverrides,
) -> OcrConfig {
    let empty = ApplicationConfiguration::default();
    let record = record.unwrap_or(&empty);

    OcrConfig {
        pages: overrides
            .pages
            .or(record.pages.filter(|p| *p > 0))
            .or(settings.pages),
        language: overrides
            .language
            .clone()
            .or_else(|| record.language.clone().filter(|l| !l.is_empty()))
            .unwrap_or_else(|| settings.language.clone()),
        output_type: overrides
            .output_type
            .or(record.output_type)
            .unwrap_or(settings.output_type),
        mode: overrides.mode.or(record.mode).unwrap_or(settings.mode),
        skip_archive_file: overrides
            .skip_archive_file
            .or(record.skip_archive_file)
            .unwrap_or(settings.skip_archive_file),
        image_dpi: overrides
            .image_dpi
            .or(record.image_dpi.filter(|d| *d > 0))
            .or(settings.image_dpi),
        clean: overrides
            .clean
            .or(record.unpaper_clean)
            .unwrap_or(settings.clean),
        deskew: overrides
            .deskew
            .or(record.deskew)
            .unwrap_or(settings.deskew),
        rotate: overrides
            .rotate
            .or(record.rotate_pages)
            .unwrap_or(settings.rotate_pages),
        rotate_threshold: overrides
            .rotate_threshold
            .or(record.rotate_pages_threshold.filter(|t| *t != 0.0))
            .unwrap_or(settings.rotate_pages_threshold),
        max_image_pixels: overrides
            .max_image_pixels
            .or(record.max_image_pixels.filter(|p| *p != 0.0))
            .or(settings.max_image_pixels),
        color_conversion_strategy: overrides
            .color_conversion_strategy
            .or(record.color_conversion_strategy)
            .unwrap_or(settings.color_conversion_strategy),
        user_args: overrides
            .user_args
            .clone()
            .or_else(|| record.user_args.clone().filter(|a| !a.is_empty()))
            .or_else(|| settings_user_args(settings)),
        threads: settings.threads_per_worker,
    }
}

/// Parses the JSON string from settings. Garbage yields an empty mapping.
fn settings_user_args(settings: &OcrSettings) -> Option<Map<String, Value>> {
    let raw = settings.user_args.as_deref()?;
    match serde_json::from_str::<Map<String, Value>>(raw) {
        Ok(args) => Some(args),
        Err(e) => {
            tracing::warn!(
                "Error while parsing OCR user args {:?}, ignoring them: {}",
                raw,
                e
            );
            Some(Map::new())
        }
    }
}
