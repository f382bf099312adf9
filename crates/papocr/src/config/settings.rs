//! Static OCR settings: the lowest-precedence configuration layer.
//!
//! Values come from built-in defaults, optionally a JSON settings file, and
//! finally `PAPOCR_*` environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::schema::{
    CleanMode, ColorConversionStrategy, OcrMode, OutputType, SkipArchiveFile,
};
use crate::error::ConfigError;

pub const ENV_PREFIX: &str = "PAPOCR_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Only OCR the first N pages. `None` or `0` processes every page.
    pub pages: Option<u32>,
    pub language: String,
    pub mode: OcrMode,
    pub skip_archive_file: SkipArchiveFile,
    pub output_type: OutputType,
    /// Fallback DPI for images without resolution metadata.
    pub image_dpi: Option<u32>,
    pub clean: CleanMode,
    pub deskew: bool,
    pub rotate_pages: bool,
    pub rotate_pages_threshold: f64,
    /// Zero or negative disables the engine's decompression bomb limit.
    pub max_image_pixels: Option<f64>,
    pub color_conversion_strategy: ColorConversionStrategy,
    /// Extra engine arguments as a JSON object string.
    pub user_args: Option<String>,
    pub threads_per_worker: usize,
    pub scratch_dir: PathBuf,
    pub ocrmypdf_binary: String,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            pages: None,
            language: "eng".to_string(),
            mode: OcrMode::Skip,
            skip_archive_file: SkipArchiveFile::Never,
            output_type: OutputType::PdfA,
            image_dpi: None,
            clean: CleanMode::Clean,
            deskew: true,
            rotate_pages: true,
            rotate_pages_threshold: 12.0,
            max_image_pixels: None,
            color_conversion_strategy: ColorConversionStrategy::Rgb,
            user_args: None,
            threads_per_worker: num_cpus::get().max(1),
            scratch_dir: std::env::temp_dir(),
            ocrmypdf_binary: "ocrmypdf".to_string(),
        }
    }
}

impl OcrSettings {
    /// Defaults overlaid with any `PAPOCR_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Applies `PAPOCR_*` environment variables on top of `self`.
    ///
    /// Empty variables are treated as unset.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(v) = env_value("OCR_PAGES") {
            self.pages = Some(parse_env("OCR_PAGES", &v)?);
        }
        if let Some(v) = env_value("OCR_LANGUAGE") {
            self.language = v;
        }
        if let Some(v) = env_value("OCR_MODE") {
            self.mode = v.parse()?;
        }
        if let Some(v) = env_value("OCR_SKIP_ARCHIVE_FILE") {
            self.skip_archive_file = v.parse()?;
        }
        if let Some(v) = env_value("OCR_OUTPUT_TYPE") {
            self.output_type = v.parse()?;
        }
        if let Some(v) = env_value("OCR_IMAGE_DPI") {
            self.image_dpi = Some(parse_env("OCR_IMAGE_DPI", &v)?);
        }
        if let Some(v) = env_value("OCR_CLEAN") {
            self.clean = v.parse()?;
        }
        if let Some(v) = env_value("OCR_DESKEW") {
            self.deskew = parse_bool("OCR_DESKEW", &v)?;
        }
        if let Some(v) = env_value("OCR_ROTATE_PAGES") {
            self.rotate_pages = parse_bool("OCR_ROTATE_PAGES", &v)?;
        }
        if let Some(v) = env_value("OCR_ROTATE_PAGES_THRESHOLD") {
            self.rotate_pages_threshold = parse_env("OCR_ROTATE_PAGES_THRESHOLD", &v)?;
        }
        if let Some(v) = env_value("OCR_MAX_IMAGE_PIXELS") {
            self.max_image_pixels = Some(parse_env("OCR_MAX_IMAGE_PIXELS", &v)?);
        }
        if let Some(v) = env_value("OCR_COLOR_CONVERSION_STRATEGY") {
            self.color_conversion_strategy = v.parse()?;
        }
        if let Some(v) = env_value("OCR_USER_ARGS") {
            self.user_args = Some(v);
        }
        if let Some(v) = env_value("THREADS_PER_WORKER") {
            self.threads_per_worker = parse_env::<usize>("THREADS_PER_WORKER", &v)?.max(1);
        }
        if let Some(v) = env_value("SCRATCH_DIR") {
            self.scratch_dir = PathBuf::from(v);
        }
        if let Some(v) = env_value("OCRMYPDF_BINARY") {
            self.ocrmypdf_binary = v;
        }

        Ok(self)
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(format!("{}{}", ENV_PREFIX, name))
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::invalid(&format!("{}{}", ENV_PREFIX, name), value))
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" | "t" => Ok(true),
        "0" | "false" | "no" | "n" | "off" | "f" => Ok(false),
        _ => Err(ConfigError::invalid(
            &format!("{}{}", ENV_PREFIX, name),
            value,
        )),
    }
}
