pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod ocr;
pub mod parser;

pub use config::{
    load_settings, resolve, ApplicationConfiguration, DatabaseConfigProvider, OcrConfig,
    OcrConfigProvider, OcrOverrides, OcrSettings, StaticConfigProvider,
};
pub use db::{Database, DatabaseError};
pub use error::{ConfigError, PapocrError, ParseError, Result};
pub use ocr::{construct_parameters, EngineError, OcrEngine, OcrMyPdfEngine, ParameterRequest, ParameterSet};
pub use parser::{post_process_text, DocumentFormat, DocumentParser, ParsedDocument};
