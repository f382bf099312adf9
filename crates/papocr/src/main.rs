use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use papocr::config::schema::{CleanMode, OcrMode, OutputType, SkipArchiveFile};
use papocr::db::default_database_path;
use papocr::parser::image::resolve_dpi;
use papocr::{
    construct_parameters, load_settings, logging, Database, DatabaseConfigProvider, DocumentFormat,
    DocumentParser, OcrConfigProvider, OcrMyPdfEngine, OcrOverrides, OcrSettings, PapocrError,
    ParameterRequest, StaticConfigProvider,
};

#[derive(Parser)]
#[command(name = "papocr")]
#[command(about = "Produce searchable PDF archives and text from scanned documents")]
#[command(version)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// OCR a document and print its text
    Parse {
        file: PathBuf,
        /// Mime type of the document (guessed from the extension if omitted)
        #[arg(long)]
        mime_type: Option<String>,
        /// Copy the archive PDF into this directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Print the OCRmyPDF parameters that would be used, without running it
    Params {
        file: PathBuf,
        #[arg(long)]
        mime_type: Option<String>,
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Args)]
struct ConfigArgs {
    /// JSON settings file
    #[arg(long, env = "PAPOCR_SETTINGS")]
    settings: Option<PathBuf>,
    /// Database holding the persisted configuration record
    #[arg(long, env = "PAPOCR_DATABASE")]
    database: Option<PathBuf>,
    /// Ignore any persisted configuration
    #[arg(long)]
    no_database: bool,
    #[arg(long)]
    mode: Option<OcrMode>,
    #[arg(long)]
    pages: Option<u32>,
    #[arg(short, long)]
    language: Option<String>,
    #[arg(long)]
    output_type: Option<OutputType>,
    #[arg(long)]
    skip_archive_file: Option<SkipArchiveFile>,
    #[arg(long)]
    clean: Option<CleanMode>,
    #[arg(long)]
    image_dpi: Option<u32>,
}

impl ConfigArgs {
    fn overrides(&self) -> OcrOverrides {
        OcrOverrides {
            mode: self.mode,
            pages: self.pages,
            language: self.language.clone(),
            output_type: self.output_type,
            skip_archive_file: self.skip_archive_file,
            clean: self.clean,
            image_dpi: self.image_dpi,
            ..OcrOverrides::default()
        }
    }

    fn settings(&self) -> Result<OcrSettings, PapocrError> {
        let settings = match &self.settings {
            Some(path) => load_settings(path)?,
            None => OcrSettings::default(),
        };
        Ok(settings.with_env_overrides()?)
    }

    fn database(&self) -> Result<Option<Database>, PapocrError> {
        if self.no_database {
            return Ok(None);
        }
        if let Some(path) = &self.database {
            return Ok(Some(Database::open(path)?));
        }
        match default_database_path().filter(|p| p.is_file()) {
            Some(path) => Ok(Some(Database::open(&path)?)),
            None => Ok(None),
        }
    }

    fn provider(&self, settings: OcrSettings) -> Result<Box<dyn OcrConfigProvider>, PapocrError> {
        let overrides = self.overrides();
        Ok(match self.database()? {
            Some(db) => {
                Box::new(DatabaseConfigProvider::new(db, settings).with_overrides(overrides))
            }
            None => Box::new(StaticConfigProvider::new(settings).with_overrides(overrides)),
        })
    }
}

fn mime_type_for(file: &Path, explicit: Option<String>) -> String {
    explicit.unwrap_or_else(|| {
        mime_guess::from_path(file)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    })
}

fn run_parse(
    file: &Path,
    mime_type: &str,
    output_dir: Option<&Path>,
    config: &ConfigArgs,
) -> Result<(), PapocrError> {
    let settings = config.settings()?;
    let engine = OcrMyPdfEngine::new(settings.ocrmypdf_binary.clone());
    let scratch_dir = settings.scratch_dir.clone();
    let parser = DocumentParser::new(config.provider(settings)?, Box::new(engine))
        .with_scratch_dir(scratch_dir);

    let parsed = parser.parse(file, mime_type)?;
    println!("{}", parsed.text);

    if let (Some(dir), Some(archive)) = (output_dir, parsed.archive_path.as_ref()) {
        let stem = file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let target = dir.join(format!("{}.pdf", stem));
        std::fs::create_dir_all(dir)
            .and_then(|_| std::fs::copy(archive, &target))
            .map_err(|e| PapocrError::Output {
                path: target.clone(),
                source: e,
            })?;
        tracing::info!("Archive written to {}", target.display());
    } else if output_dir.is_some() {
        tracing::info!("No archive was produced for {}", file.display());
    }

    if let Err(e) = parsed.cleanup() {
        tracing::warn!("Failed to remove working directory: {}", e);
    }
    Ok(())
}

fn run_params(file: &Path, mime_type: &str, config: &ConfigArgs) -> Result<(), PapocrError> {
    let settings = config.settings()?;
    let scratch_dir = settings.scratch_dir.clone();
    let ocr_config = config.provider(settings)?.ocr_config()?;

    let image_dpi = match DocumentFormat::from_mime_type(mime_type) {
        Some(DocumentFormat::Image) => resolve_dpi(file, ocr_config.image_dpi)?,
        _ => None,
    };

    let request = ParameterRequest::new(
        file,
        scratch_dir.join("archive.pdf"),
        scratch_dir.join("sidecar.txt"),
        mime_type,
    )
    .image_dpi(image_dpi);
    let params = construct_parameters(&request, &ocr_config);

    println!("{}", serde_json::to_string_pretty(&params)?);
    Ok(())
}

fn run(cli: Cli) -> Result<(), PapocrError> {
    logging::init_tracing(cli.json_logs)?;

    match cli.command {
        Commands::Parse {
            file,
            mime_type,
            output_dir,
            config,
        } => {
            let mime_type = mime_type_for(&file, mime_type);
            run_parse(&file, &mime_type, output_dir.as_deref(), &config)
        }
        Commands::Params {
            file,
            mime_type,
            config,
        } => {
            let mime_type = mime_type_for(&file, mime_type);
            run_params(&file, &mime_type, &config)
        }
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
