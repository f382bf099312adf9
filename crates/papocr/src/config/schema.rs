use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputType {
    #[serde(rename = "pdf")]
    Pdf,
    #[serde(rename = "pdfa")]
    PdfA,
    #[serde(rename = "pdfa-1")]
    PdfA1,
    #[serde(rename = "pdfa-2")]
    PdfA2,
    #[serde(rename = "pdfa-3")]
    PdfA3,
}

impl OutputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::PdfA => "pdfa",
            Self::PdfA1 => "pdfa-1",
            Self::PdfA2 => "pdfa-2",
            Self::PdfA3 => "pdfa-3",
        }
    }

    pub fn is_pdfa(&self) -> bool {
        !matches!(self, Self::Pdf)
    }
}

impl FromStr for OutputType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "pdfa" => Ok(Self::PdfA),
            "pdfa-1" => Ok(Self::PdfA1),
            "pdfa-2" => Ok(Self::PdfA2),
            "pdfa-3" => Ok(Self::PdfA3),
            _ => Err(ConfigError::invalid("output_type", s)),
        }
    }
}

/// How the engine treats pages that already carry text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrMode {
    Skip,
    Redo,
    Force,
    /// Like `Skip`, but never produce an archive for documents that have text.
    #[serde(rename = "skip_noarchive")]
    SkipNoArchive,
}

impl OcrMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Redo => "redo",
            Self::Force => "force",
            Self::SkipNoArchive => "skip_noarchive",
        }
    }
}

impl FromStr for OcrMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "redo" => Ok(Self::Redo),
            "force" => Ok(Self::Force),
            "skip_noarchive" => Ok(Self::SkipNoArchive),
            _ => Err(ConfigError::invalid("mode", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CleanMode {
    #[serde(rename = "clean")]
    Clean,
    #[serde(rename = "clean-final")]
    CleanFinal,
    #[serde(rename = "none")]
    None,
}

impl CleanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::CleanFinal => "clean-final",
            Self::None => "none",
        }
    }
}

impl FromStr for CleanMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clean" => Ok(Self::Clean),
            "clean-final" => Ok(Self::CleanFinal),
            "none" => Ok(Self::None),
            _ => Err(ConfigError::invalid("clean", s)),
        }
    }
}

/// Ghostscript color conversion strategy, only meaningful for PDF/A output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorConversionStrategy {
    LeaveColorUnchanged,
    #[serde(rename = "RGB")]
    Rgb,
    UseDeviceIndependentColor,
    Gray,
    #[serde(rename = "CMYK")]
    Cmyk,
}

impl ColorConversionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeaveColorUnchanged => "LeaveColorUnchanged",
            Self::Rgb => "RGB",
            Self::UseDeviceIndependentColor => "UseDeviceIndependentColor",
            Self::Gray => "Gray",
            Self::Cmyk => "CMYK",
        }
    }
}

impl FromStr for ColorConversionStrategy {
    type Err = ConfigError;

    // Ghostscript names are case sensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "LeaveColorUnchanged" => Ok(Self::LeaveColorUnchanged),
            "RGB" => Ok(Self::Rgb),
            "UseDeviceIndependentColor" => Ok(Self::UseDeviceIndependentColor),
            "Gray" => Ok(Self::Gray),
            "CMYK" => Ok(Self::Cmyk),
            _ => Err(ConfigError::invalid("color_conversion_strategy", s)),
        }
    }
}

/// When to skip producing an archive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipArchiveFile {
    Never,
    WithText,
    Always,
}

impl SkipArchiveFile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::WithText => "with_text",
            Self::Always => "always",
        }
    }
}

impl FromStr for SkipArchiveFile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "never" => Ok(Self::Never),
            "with_text" => Ok(Self::WithText),
            "always" => Ok(Self::Always),
            _ => Err(ConfigError::invalid("skip_archive_file", s)),
        }
    }
}

macro_rules! impl_display {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

impl_display!(
    OutputType,
    OcrMode,
    CleanMode,
    ColorConversionStrategy,
    SkipArchiveFile
);
