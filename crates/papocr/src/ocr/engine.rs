use std::ffi::OsString;
use std::process::Command;

use serde_json::Value;
use thiserror::Error;

use crate::ocr::params::ParameterSet;

/// Failures reported by an OCR engine. These never leave the parser.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("OCR engine '{0}' is not installed or not on PATH")]
    NotInstalled(String),

    #[error("Input file is encrypted: {0}")]
    Encrypted(String),

    #[error("Input file carries a digital signature: {0}")]
    DigitalSignature(String),

    #[error("Input file error: {0}")]
    InputFile(String),

    #[error("Subprocess output error: {0}")]
    Subprocess(String),

    #[error("OCR engine failed (exit code {code:?}): {message}")]
    Failed { code: Option<i32>, message: String },

    #[error("Failed to run OCR engine: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs OCR over the input named in a [`ParameterSet`], writing the
/// archive (and sidecar, if requested) to the paths it names.
pub trait OcrEngine: Send + Sync {
    fn ocr(&self, params: &ParameterSet) -> Result<(), EngineError>;
}

/// Options that only make sense for the Python API.
const API_ONLY_KEYS: &[&str] = &["use_threads", "progress_bar", "plugins"];

const POSITIONAL_KEYS: &[&str] = &["input_file", "output_file"];

/// `ocrmypdf` invoked as a subprocess.
#[derive(Debug, Clone)]
pub struct OcrMyPdfEngine {
    binary: String,
}

impl Default for OcrMyPdfEngine {
    fn default() -> Self {
        Self::new("ocrmypdf")
    }
}

impl OcrMyPdfEngine {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Renders the parameter set as command line arguments.
    ///
    /// `true` becomes a bare flag, `false` and null are omitted, arrays
    /// repeat the option, and the input/output files go last.
    pub fn to_args(params: &ParameterSet) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        for (key, value) in params.iter() {
            if POSITIONAL_KEYS.contains(&key.as_str()) || API_ONLY_KEYS.contains(&key.as_str()) {
                continue;
            }
            let flag = format!("--{}", key.replace('_', "-"));
            match value {
                Value::Null | Value::Bool(false) => {}
                Value::Bool(true) => args.push(flag.into()),
                Value::Array(items) => {
                    for item in items {
                        args.push(flag.clone().into());
                        args.push(render_value(item).into());
                    }
                }
                other => {
                    args.push(flag.into());
                    args.push(render_value(other).into());
                }
            }
        }

        for key in POSITIONAL_KEYS {
            if let Some(value) = params.get(key) {
                args.push(render_value(value).into());
            }
        }

        args
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Maps an ocrmypdf exit status onto an [`EngineError`].
///
/// See `ocrmypdf.ExitCode`: 2 is a bad input file, 7 a child process
/// failure, 8 an encrypted PDF.
pub fn classify_exit(code: Option<i32>, stderr: &str) -> Result<(), EngineError> {
    let message = stderr.trim().to_string();
    match code {
        Some(0) => Ok(()),
        Some(2) if message.to_lowercase().contains("digital signature") => {
            Err(EngineError::DigitalSignature(message))
        }
        Some(2) => Err(EngineError::InputFile(message)),
        Some(7) => Err(EngineError::Subprocess(message)),
        Some(8) => Err(EngineError::Encrypted(message)),
        code => Err(EngineError::Failed { code, message }),
    }
}

impl OcrEngine for OcrMyPdfEngine {
    fn ocr(&self, params: &ParameterSet) -> Result<(), EngineError> {
        let _span = tracing::info_span!("ocr.ocrmypdf").entered();

        let args = Self::to_args(params);
        tracing::debug!("Calling {} with args {:?}", self.binary, args);

        let output = Command::new(&self.binary)
            .args(&args)
            .env("OMP_THREAD_LIMIT", "1")
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => EngineError::NotInstalled(self.binary.clone()),
                _ => EngineError::Io(e),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        classify_exit(output.status.code(), &stderr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_to_args_flags_and_values() {
        let mut params = ParameterSet::new();
        params.insert("input_file", "/in.pdf");
        params.insert("output_file", "/out.pdf");
        params.insert("skip_text", true);
        params.insert("deskew", false);
        params.insert("language", "eng+deu");
        params.insert("rotate_pages_threshold", 12.5);
        params.insert("jobs", 4);
        params.insert("sidecar", Value::Null);

        let args = strings(OcrMyPdfEngine::to_args(&params));

        assert_eq!(
            args,
            vec![
                "--jobs",
                "4",
                "--language",
                "eng+deu",
                "--rotate-pages-threshold",
                "12.5",
                "--skip-text",
                "/in.pdf",
                "/out.pdf",
            ]
        );
    }

    #[test]
    fn test_to_args_arrays_repeat() {
        let mut params = ParameterSet::new();
        params.insert("tesseract_config", json!(["a.cfg", "b.cfg"]));

        let args = strings(OcrMyPdfEngine::to_args(&params));
        assert_eq!(
            args,
            vec!["--tesseract-config", "a.cfg", "--tesseract-config", "b.cfg"]
        );
    }

    #[test]
    fn test_to_args_skips_api_only_keys() {
        let mut params = ParameterSet::new();
        params.insert("use_threads", true);
        params.insert("progress_bar", false);

        assert!(OcrMyPdfEngine::to_args(&params).is_empty());
    }

    #[test]
    fn test_classify_exit() {
        assert!(classify_exit(Some(0), "").is_ok());
        assert!(matches!(
            classify_exit(Some(2), "bad page"),
            Err(EngineError::InputFile(_))
        ));
        assert!(matches!(
            classify_exit(Some(2), "Input PDF has a Digital Signature"),
            Err(EngineError::DigitalSignature(_))
        ));
        assert!(matches!(
            classify_exit(Some(7), "Ghostscript PDF/A rendering failed"),
            Err(EngineError::Subprocess(_))
        ));
        assert!(matches!(
            classify_exit(Some(8), ""),
            Err(EngineError::Encrypted(_))
        ));
        assert!(matches!(
            classify_exit(None, ""),
            Err(EngineError::Failed { code: None, .. })
        ));
        match classify_exit(Some(15), " boom \n") {
            Err(EngineError::Failed { code, message }) => {
                assert_eq!(code, Some(15));
                assert_eq!(message, "boom");
            }
            other => panic!("Expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_binary_is_not_installed() {
        let engine = OcrMyPdfEngine::new("papocr-no-such-binary");
        let result = engine.ocr(&ParameterSet::new());
        assert!(matches!(result, Err(EngineError::NotInstalled(name)) if name == "papocr-no-such-binary"));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_failed() {
        let engine = OcrMyPdfEngine::new("false");
        assert!(matches!(
            engine.ocr(&ParameterSet::new()),
            Err(EngineError::Failed { code: Some(1), .. })
        ));
    }
}
