//! Raster image normalization before OCR.

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::process::Command;

use image::ImageReader;
use tiff::decoder::ifd::Value as TiffValue;
use tiff::decoder::Decoder as TiffDecoder;
use tiff::tags::Tag;

use crate::error::ParseError;

/// Images below this resolution usually OCR badly.
pub const LOW_DPI_WARNING: u32 = 70;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Reads the resolution stored in the image metadata.
///
/// Supports the PNG `pHYs` chunk, the JPEG JFIF density, TIFF
/// `XResolution` and the BMP pixels per meter. The format is sniffed from
/// the content. Returns `None` when the file carries no absolute resolution.
pub fn get_dpi(path: &Path) -> Option<u32> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Error while getting DPI from image {}: {}", path.display(), e);
            return None;
        }
    };

    let dpi = if bytes.starts_with(PNG_SIGNATURE) {
        png_dpi(&bytes)
    } else if bytes.starts_with(&[0xFF, 0xD8]) {
        jfif_dpi(&bytes)
    } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
        tiff_dpi(&bytes)
    } else if bytes.starts_with(b"BM") {
        bmp_dpi(&bytes)
    } else {
        None
    };
    dpi.filter(|d| *d > 0)
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let slice = bytes.get(at..at + 4)?;
    Some(u32::from_be_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    let slice = bytes.get(at..at + 2)?;
    Some(u16::from_be_bytes([slice[0], slice[1]]))
}

fn png_dpi(bytes: &[u8]) -> Option<u32> {
    let mut pos = PNG_SIGNATURE.len();
    while pos + 8 <= bytes.len() {
        let length = read_u32(bytes, pos)? as usize;
        let kind = bytes.get(pos + 4..pos + 8)?;
        let data = pos + 8;
        match kind {
            b"pHYs" => {
                let x = read_u32(bytes, data)?;
                let unit = *bytes.get(data + 8)?;
                // unit 1 is pixels per meter, 0 is aspect ratio only
                return (unit == 1).then(|| (x as f64 * 0.0254).round() as u32);
            }
            b"IDAT" | b"IEND" => return None,
            _ => {}
        }
        pos = data + length + 4;
    }
    None
}

fn jfif_dpi(bytes: &[u8]) -> Option<u32> {
    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        // start of scan, no more headers
        if marker == 0xDA {
            return None;
        }
        let length = read_u16(bytes, pos + 2)? as usize;
        let segment = pos + 4;
        if marker == 0xE0 && bytes.get(segment..segment + 5) == Some(b"JFIF\0".as_slice()) {
            let units = *bytes.get(segment + 7)?;
            let x = read_u16(bytes, segment + 8)? as f64;
            return match units {
                1 => Some(x as u32),
                2 => Some((x * 2.54).round() as u32),
                _ => None,
            };
        }
        pos += 2 + length;
    }
    None
}

/// Resolution of the first IFD. A missing unit means inches, unit 1 means
/// the resolution is only an aspect ratio.
fn tiff_dpi(bytes: &[u8]) -> Option<u32> {
    let mut decoder = TiffDecoder::new(Cursor::new(bytes)).ok()?;
    let x = match decoder.find_tag(Tag::XResolution).ok()?? {
        TiffValue::Rational(n, d) if d != 0 => n as f64 / d as f64,
        other => other.into_f64().ok()?,
    };
    let unit = match decoder.find_tag(Tag::ResolutionUnit).ok()? {
        Some(value) => value.into_u16().ok()?,
        None => 2,
    };
    match unit {
        2 => Some(x.round() as u32),
        3 => Some((x * 2.54).round() as u32),
        _ => None,
    }
}

/// `biXPelsPerMeter` of a BITMAPINFOHEADER or later DIB header.
fn bmp_dpi(bytes: &[u8]) -> Option<u32> {
    let header_size = u32::from_le_bytes(bytes.get(14..18)?.try_into().ok()?);
    if header_size < 40 {
        return None;
    }
    let per_meter = i32::from_le_bytes(bytes.get(38..42)?.try_into().ok()?);
    (per_meter > 0).then(|| (per_meter as f64 * 0.0254).round() as u32)
}

/// Opens an image with the decoder matching its content, whatever the
/// file is called.
fn open_image(path: &Path) -> Result<ImageReader<BufReader<File>>, ParseError> {
    let preparation = |reason: String| ParseError::ImagePreparation {
        path: path.to_path_buf(),
        reason,
    };
    ImageReader::open(path)
        .map_err(|e| preparation(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| preparation(e.to_string()))
}

/// Picks the resolution handed to the engine: the image metadata, then the
/// configured DPI, then the A4 guess. `None` when all of them are missing
/// or zero.
pub fn resolve_dpi(path: &Path, configured: Option<u32>) -> Result<Option<u32>, ParseError> {
    if let Some(dpi) = get_dpi(path).or(configured.filter(|d| *d > 0)) {
        return Ok(Some(dpi));
    }
    let a4_dpi = calculate_a4_dpi(path)?;
    Ok((a4_dpi > 0).then_some(a4_dpi))
}

/// Guesses a resolution by assuming the image spans the width of an A4
/// page. Tiny images yield 0.
pub fn calculate_a4_dpi(path: &Path) -> Result<u32, ParseError> {
    let (width, _) = open_image(path)?
        .into_dimensions()
        .map_err(|e| ParseError::ImagePreparation {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    let dpi = (width as f64 / (21.0 / 2.54)) as u32;
    tracing::debug!("Estimated DPI {} based on image width {}", dpi, width);
    Ok(dpi)
}

pub fn has_alpha(path: &Path) -> Result<bool, ParseError> {
    let image = open_image(path)?
        .decode()
        .map_err(|e| ParseError::ImagePreparation {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(image.color().has_alpha())
}

/// Writes a copy of the image without alpha channel into `dir` using
/// ImageMagick and returns its path.
pub fn remove_alpha(path: &Path, dir: &Path) -> Result<PathBuf, ParseError> {
    let extension = open_image(path)?
        .format()
        .and_then(|f| f.extensions_str().first().copied())
        .unwrap_or("png");
    let output_path = dir.join(format!("image-no-alpha.{}", extension));

    let output = Command::new("convert")
        .arg(path)
        .args(["-alpha", "off"])
        .arg(&output_path)
        .output()
        .map_err(|e| ParseError::ImagePreparation {
            path: path.to_path_buf(),
            reason: format!(
                "Failed to run convert: {}. Make sure ImageMagick is installed.",
                e
            ),
        })?;

    if !output.status.success() {
        return Err(ParseError::ImagePreparation {
            path: path.to_path_buf(),
            reason: format!(
                "convert failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ),
        });
    }

    Ok(output_path)
}
