//! Maps an effective [`OcrConfig`] onto the flat option set consumed by
//! the OCR engine.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::schema::{CleanMode, OcrMode};
use crate::config::OcrConfig;

/// Flat option name to value mapping, passed verbatim to the engine.
///
/// Absent keys mean "engine default".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParameterSet(Map<String, Value>);

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Path-valued option, e.g. `input_file`.
    pub fn path(&self, key: &str) -> Option<PathBuf> {
        self.0.get(key).and_then(Value::as_str).map(PathBuf::from)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Per-invocation inputs that do not come from configuration.
#[derive(Debug, Clone)]
pub struct ParameterRequest {
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub sidecar_file: PathBuf,
    pub mime_type: String,
    pub safe_fallback: bool,
    pub image_dpi: Option<u32>,
}

impl ParameterRequest {
    pub fn new(
        input_file: impl Into<PathBuf>,
        output_file: impl Into<PathBuf>,
        sidecar_file: impl Into<PathBuf>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            input_file: input_file.into(),
            output_file: output_file.into(),
            sidecar_file: sidecar_file.into(),
            mime_type: mime_type.into(),
            safe_fallback: false,
            image_dpi: None,
        }
    }

    pub fn safe_fallback(mut self, safe_fallback: bool) -> Self {
        self.safe_fallback = safe_fallback;
        self
    }

    pub fn image_dpi(mut self, dpi: Option<u32>) -> Self {
        self.image_dpi = dpi;
        self
    }
}

fn path_value(path: &Path) -> Value {
    Value::String(path.to_string_lossy().into_owned())
}

pub fn construct_parameters(request: &ParameterRequest, config: &OcrConfig) -> ParameterSet {
    let mut params = ParameterSet::new();

    params.insert("input_file", path_value(&request.input_file));
    params.insert("output_file", path_value(&request.output_file));
    params.insert("language", config.language.as_str());
    params.insert("output_type", config.output_type.as_str());
    params.insert("jobs", config.threads as u64);

    if config.output_type.is_pdfa() {
        params.insert(
            "color_conversion_strategy",
            config.color_conversion_strategy.as_str(),
        );
    }

    if config.mode == OcrMode::Force || request.safe_fallback {
        params.insert("force_ocr", true);
    } else if matches!(config.mode, OcrMode::Skip | OcrMode::SkipNoArchive) {
        params.insert("skip_text", true);
    } else if config.mode == OcrMode::Redo {
        params.insert("redo_ocr", true);
    }

    match config.clean {
        CleanMode::Clean => params.insert("clean", true),
        // clean_final cannot be combined with redo_ocr
        CleanMode::CleanFinal if config.mode == OcrMode::Redo => params.insert("clean", true),
        CleanMode::CleanFinal => params.insert("clean_final", true),
        CleanMode::None => {}
    }

    if config.deskew && config.mode != OcrMode::Redo {
        params.insert("deskew", true);
    }

    if config.rotate {
        params.insert("rotate_pages", true);
        params.insert("rotate_pages_threshold", config.rotate_threshold);
    }

    match config.pages.filter(|p| *p > 0) {
        Some(pages) => params.insert("pages", format!("1-{}", pages)),
        // the engine refuses a sidecar together with a page range
        None => params.insert("sidecar", path_value(&request.sidecar_file)),
    }

    if let Some(dpi) = request.image_dpi {
        params.insert("image_dpi", dpi as u64);
    }

    match config.max_image_pixels {
        Some(pixels) if pixels > 0.0 => {
            params.insert("max_image_mpixels", pixels / 1_000_000.0);
        }
        Some(pixels) => {
            tracing::debug!(
                "max_image_pixels is {}, leaving the image size unlimited",
                pixels
            );
        }
        None => {}
    }

    if let Some(user_args) = &config.user_args {
        for (key, value) in user_args {
            params.insert(key.clone(), value.clone());
        }
    }

    params
}
