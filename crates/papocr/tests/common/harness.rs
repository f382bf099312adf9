//! Test harness for isolated parser runs.
//!
//! `TestHarness` owns a temp directory with an input folder and a scratch
//! folder, and builds `DocumentParser`s wired to a `FakeEngine` that
//! records every parameter set it receives.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use papocr::config::{OcrConfigProvider, OcrSettings, StaticConfigProvider};
use papocr::ocr::{EngineError, OcrEngine, ParameterSet};
use papocr::parser::DocumentParser;

use super::builders::write_pdf;

/// What the fake engine does on one invocation.
#[derive(Debug, Clone)]
pub enum EngineOutcome {
    /// Writes an archive PDF containing `archive_text` (a blank page when
    /// empty) and, if the parameters ask for one, a sidecar with
    /// `sidecar_text`.
    Succeed {
        archive_text: String,
        sidecar_text: String,
    },
    Encrypted,
    DigitalSignature,
    InputFile,
    Subprocess(String),
    Failed,
}

impl EngineOutcome {
    pub fn ocr_text(text: &str) -> Self {
        EngineOutcome::Succeed {
            archive_text: text.to_string(),
            sidecar_text: text.to_string(),
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeEngine {
    outcomes: Arc<Mutex<VecDeque<EngineOutcome>>>,
    calls: Arc<Mutex<Vec<ParameterSet>>>,
}

impl FakeEngine {
    /// Plays the outcomes in order, then succeeds with generic OCR text.
    pub fn new(outcomes: Vec<EngineOutcome>) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(outcomes.into())),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<ParameterSet> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

/// Text the fake engine produces once its script is exhausted.
pub const DEFAULT_OCR_TEXT: &str = "Recognized text from the fake engine";

impl OcrEngine for FakeEngine {
    fn ocr(&self, params: &ParameterSet) -> Result<(), EngineError> {
        self.calls.lock().unwrap().push(params.clone());
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| EngineOutcome::ocr_text(DEFAULT_OCR_TEXT));

        match outcome {
            EngineOutcome::Succeed {
                archive_text,
                sidecar_text,
            } => {
                let output = params.path("output_file").expect("output_file missing");
                write_pdf(&output, &[archive_text.as_str()]);
                if let Some(sidecar) = params.path("sidecar") {
                    std::fs::write(sidecar, sidecar_text).unwrap();
                }
                Ok(())
            }
            EngineOutcome::Encrypted => Err(EngineError::Encrypted("encrypted".to_string())),
            EngineOutcome::DigitalSignature => Err(EngineError::DigitalSignature(
                "Input PDF has a digital signature".to_string(),
            )),
            EngineOutcome::InputFile => Err(EngineError::InputFile("bad input".to_string())),
            EngineOutcome::Subprocess(msg) => Err(EngineError::Subprocess(msg)),
            EngineOutcome::Failed => Err(EngineError::Failed {
                code: Some(15),
                message: "unexpected".to_string(),
            }),
        }
    }
}

pub struct TestHarness {
    temp_dir: TempDir,
    pub input_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub engine: FakeEngine,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_outcomes(vec![])
    }

    pub fn with_outcomes(outcomes: Vec<EngineOutcome>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input_dir = temp_dir.path().join("input");
        let scratch_dir = temp_dir.path().join("scratch");
        std::fs::create_dir_all(&input_dir).expect("Failed to create input dir");

        Self {
            temp_dir,
            input_dir,
            scratch_dir,
            engine: FakeEngine::new(outcomes),
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn parser(&self, settings: OcrSettings) -> DocumentParser {
        self.parser_with_provider(Box::new(StaticConfigProvider::new(settings)))
    }

    pub fn parser_with_provider(&self, provider: Box<dyn OcrConfigProvider>) -> DocumentParser {
        DocumentParser::new(provider, Box::new(self.engine.clone()))
            .with_scratch_dir(&self.scratch_dir)
    }

    pub fn write_pdf(&self, filename: &str, pages: &[&str]) -> PathBuf {
        let path = self.input_dir.join(filename);
        write_pdf(&path, pages);
        path
    }

    /// Number of working directories still present in the scratch folder.
    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(&self.scratch_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
