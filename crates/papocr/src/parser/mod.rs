//! Document parsing: MIME dispatch, image normalization, the OCR engine
//! call and failure classification.

pub mod image;
pub mod pdf;
pub mod text;

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::schema::{OcrMode, SkipArchiveFile};
use crate::config::{DatabaseConfigProvider, OcrConfig, OcrConfigProvider, OcrSettings, StaticConfigProvider};
use crate::db::Database;
use crate::error::ParseError;
use crate::ocr::{construct_parameters, EngineError, OcrEngine, OcrMyPdfEngine, ParameterRequest};

pub use self::image::{calculate_a4_dpi, get_dpi, resolve_dpi};
pub use self::pdf::page_count;
pub use self::text::post_process_text;

/// Existing text longer than this counts as a usable text layer.
pub const VALID_TEXT_LENGTH: usize = 50;

const ARCHIVE_FILE: &str = "archive.pdf";
const SIDECAR_FILE: &str = "sidecar.txt";
const ARCHIVE_FALLBACK_FILE: &str = "archive-fallback.pdf";
const SIDECAR_FALLBACK_FILE: &str = "sidecar-fallback.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Image,
}

impl DocumentFormat {
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        match mime_type.trim().to_lowercase().as_str() {
            "application/pdf" => Some(DocumentFormat::Pdf),
            "image/png" | "image/jpeg" | "image/bmp" | "image/gif" | "image/tiff"
            | "image/webp" => Some(DocumentFormat::Image),
            _ => None,
        }
    }
}

/// Output of a parse. Owns the working directory; the archive and sidecar
/// paths point into it and vanish with it.
#[derive(Debug)]
pub struct ParsedDocument {
    pub text: String,
    pub archive_path: Option<PathBuf>,
    pub sidecar_path: Option<PathBuf>,
    tempdir: TempDir,
}

impl ParsedDocument {
    pub fn tempdir(&self) -> &Path {
        self.tempdir.path()
    }

    /// Deletes the working directory and everything in it.
    pub fn cleanup(self) -> std::io::Result<()> {
        self.tempdir.close()
    }
}

pub struct DocumentParser {
    config: Box<dyn OcrConfigProvider>,
    engine: Box<dyn OcrEngine>,
    scratch_dir: PathBuf,
}

impl DocumentParser {
    pub fn new(config: Box<dyn OcrConfigProvider>, engine: Box<dyn OcrEngine>) -> Self {
        Self {
            config,
            engine,
            scratch_dir: std::env::temp_dir(),
        }
    }

    /// Parser backed by `ocrmypdf`, reading the persisted configuration
    /// record when a database is given.
    pub fn from_settings(settings: OcrSettings, db: Option<Database>) -> Self {
        let engine = OcrMyPdfEngine::new(settings.ocrmypdf_binary.clone());
        let scratch_dir = settings.scratch_dir.clone();
        let config: Box<dyn OcrConfigProvider> = match db {
            Some(db) => Box::new(DatabaseConfigProvider::new(db, settings)),
            None => Box::new(StaticConfigProvider::new(settings)),
        };
        Self::new(config, Box::new(engine)).with_scratch_dir(scratch_dir)
    }

    pub fn with_scratch_dir(mut self, scratch_dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = scratch_dir.into();
        self
    }

    pub fn config(&self) -> &dyn OcrConfigProvider {
        self.config.as_ref()
    }

    pub fn page_count(&self, path: &Path, mime_type: &str) -> Option<usize> {
        match DocumentFormat::from_mime_type(mime_type) {
            Some(DocumentFormat::Pdf) => pdf::page_count(path),
            _ => None,
        }
    }

    pub fn extract_text(&self, sidecar: Option<&Path>, pdf: &Path) -> Option<String> {
        pdf::extract_text(sidecar, pdf)
    }

    pub fn parse(&self, path: &Path, mime_type: &str) -> Result<ParsedDocument, ParseError> {
        let _span = tracing::info_span!("parser.parse", mime_type).entered();

        let format = DocumentFormat::from_mime_type(mime_type)
            .ok_or_else(|| ParseError::UnsupportedMimeType(mime_type.to_string()))?;

        std::fs::metadata(path).map_err(|e| ParseError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        std::fs::create_dir_all(&self.scratch_dir).map_err(ParseError::WorkingDirectory)?;
        let tempdir = tempfile::Builder::new()
            .prefix("papocr-")
            .tempdir_in(&self.scratch_dir)
            .map_err(ParseError::WorkingDirectory)?;

        let config = self.config.ocr_config()?;

        let original_text = match format {
            DocumentFormat::Pdf => pdf::extract_text(None, path).unwrap_or_default(),
            DocumentFormat::Image => String::new(),
        };
        let original_has_text = original_text.chars().count() > VALID_TEXT_LENGTH;

        let skip_archive_for_text = config.mode == OcrMode::SkipNoArchive
            || matches!(
                config.skip_archive_file,
                SkipArchiveFile::WithText | SkipArchiveFile::Always
            );
        if skip_archive_for_text && original_has_text {
            tracing::debug!("Document has text, skipping OCRmyPDF entirely");
            return Ok(ParsedDocument {
                text: original_text,
                archive_path: None,
                sidecar_path: None,
                tempdir,
            });
        }

        let (input_file, image_dpi) = match format {
            DocumentFormat::Image => {
                let (input, dpi) = prepare_image(path, tempdir.path(), &config)?;
                (input, Some(dpi))
            }
            DocumentFormat::Pdf => (path.to_path_buf(), None),
        };

        let archive_path = tempdir.path().join(ARCHIVE_FILE);
        let sidecar_path = tempdir.path().join(SIDECAR_FILE);
        let request = ParameterRequest::new(&input_file, &archive_path, &sidecar_path, mime_type)
            .image_dpi(image_dpi);

        let mut archive = None;
        let mut text = None;

        match self.run_engine(&request, &config) {
            Ok(()) => {
                if config.skip_archive_file != SkipArchiveFile::Always {
                    archive = Some(archive_path.clone());
                }
                text = self
                    .text_from(&config, &sidecar_path, &archive_path)
                    .filter(|t| !t.is_empty());
                if text.is_none() {
                    tracing::warn!(
                        "No text was found in the original document. Attempting force OCR to get the text."
                    );
                    text = self.safe_fallback(&request, &config, tempdir.path())?;
                }
            }
            Err(EngineError::Encrypted(msg)) | Err(EngineError::DigitalSignature(msg)) => {
                tracing::warn!(
                    "This file is encrypted and/or signed, OCR is impossible. \
                     Using any text present in the original file. ({})",
                    msg
                );
                if original_has_text {
                    text = Some(original_text.clone());
                }
            }
            Err(EngineError::Subprocess(msg)) => {
                if msg.contains("Ghostscript") {
                    tracing::warn!(
                        "Ghostscript PDF/A rendering failed, consider setting \
                         user args to {{\"continue_on_soft_render_error\": true}}"
                    );
                }
                return Err(ParseError::Ocr(format!(
                    "SubprocessOutputError: {}. See logs for more information.",
                    msg
                )));
            }
            Err(EngineError::InputFile(msg)) => {
                tracing::warn!(
                    "Encountered an error while running OCR: {}. Attempting force OCR to get the text.",
                    msg
                );
                text = self.safe_fallback(&request, &config, tempdir.path())?;
            }
            Err(e) => return Err(ParseError::Ocr(e.to_string())),
        }

        let text = match text.filter(|t| !t.is_empty()) {
            Some(text) => text,
            None if original_has_text => original_text,
            None => {
                tracing::warn!(
                    "No text was found in {}, the content will be empty.",
                    path.display()
                );
                String::new()
            }
        };

        Ok(ParsedDocument {
            text,
            archive_path: archive.filter(|p| p.is_file()),
            sidecar_path: Some(sidecar_path).filter(|p| p.is_file()),
            tempdir,
        })
    }

    fn run_engine(
        &self,
        request: &ParameterRequest,
        config: &OcrConfig,
    ) -> Result<(), EngineError> {
        let params = construct_parameters(request, config);
        tracing::debug!("Calling OCR engine with args: {:?}", params);
        self.engine.ocr(&params)
    }

    fn text_from(&self, config: &OcrConfig, sidecar: &Path, archive: &Path) -> Option<String> {
        let sidecar = (config.mode != OcrMode::Redo).then_some(sidecar);
        pdf::extract_text(sidecar, archive)
    }

    /// Second, forced OCR run. Its archive is never kept.
    fn safe_fallback(
        &self,
        request: &ParameterRequest,
        config: &OcrConfig,
        workdir: &Path,
    ) -> Result<Option<String>, ParseError> {
        let _span = tracing::info_span!("parser.safe_fallback").entered();

        let archive = workdir.join(ARCHIVE_FALLBACK_FILE);
        let sidecar = workdir.join(SIDECAR_FALLBACK_FILE);
        let fallback = ParameterRequest {
            output_file: archive.clone(),
            sidecar_file: sidecar.clone(),
            ..request.clone()
        }
        .safe_fallback(true);

        self.run_engine(&fallback, config)
            .map_err(|e| ParseError::Ocr(e.to_string()))?;
        Ok(self.text_from(config, &sidecar, &archive))
    }
}

/// Determines the DPI of an image and strips its alpha channel.
///
/// Returns the file to hand to the engine and the resolution to use.
fn prepare_image(
    path: &Path,
    workdir: &Path,
    config: &OcrConfig,
) -> Result<(PathBuf, u32), ParseError> {
    let input = if image::has_alpha(path)? {
        tracing::info!("{} has an alpha channel, stripping it", path.display());
        image::remove_alpha(path, workdir)?
    } else {
        path.to_path_buf()
    };

    let dpi = image::resolve_dpi(path, config.image_dpi)?.ok_or_else(|| {
        ParseError::MissingImageDpi {
            path: path.to_path_buf(),
        }
    })?;

    if dpi < image::LOW_DPI_WARNING {
        tracing::warn!(
            "Image DPI of {} is low, OCR may fail. Consider setting an image DPI in the configuration.",
            dpi
        );
    }

    Ok((input, dpi))
}
