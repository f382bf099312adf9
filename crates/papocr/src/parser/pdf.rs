use std::path::Path;
use std::process::Command;

use crate::parser::text::post_process_text;

/// Marker ocrmypdf writes into the sidecar for pages that already had text.
pub const OCR_SKIPPED_MARKER: &str = "[OCR skipped on page";

/// Reads text for a parsed document.
///
/// The sidecar is preferred unless it is missing or carries a skip
/// marker, in which case the text layer of `pdf` is extracted instead.
pub fn extract_text(sidecar: Option<&Path>, pdf: &Path) -> Option<String> {
    if let Some(sidecar) = sidecar.filter(|s| s.is_file()) {
        match std::fs::read(sidecar) {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                if !text.contains(OCR_SKIPPED_MARKER) {
                    return Some(post_process_text(&text));
                }
                tracing::debug!("Sidecar has skipped pages, extracting text from PDF instead");
            }
            Err(e) => {
                tracing::warn!("Failed to read sidecar {}: {}", sidecar.display(), e);
            }
        }
    }

    if !pdf.is_file() {
        return None;
    }

    match pdftotext(pdf) {
        Ok(text) => Some(post_process_text(&text)),
        Err(reason) => {
            tracing::debug!("{}, using lopdf", reason);
            match lopdf_text(pdf) {
                Ok(text) => Some(post_process_text(&text)),
                Err(e) => {
                    tracing::warn!(
                        "Error while getting text from PDF document {}: {}",
                        pdf.display(),
                        e
                    );
                    None
                }
            }
        }
    }
}

fn pdftotext(pdf: &Path) -> Result<String, String> {
    let output = Command::new("pdftotext")
        .args(["-q", "-layout", "-enc", "UTF-8"])
        .arg(pdf)
        .arg("-")
        .output()
        .map_err(|e| format!("Failed to run pdftotext: {}", e))?;

    if !output.status.success() {
        return Err(format!(
            "pdftotext failed: {}",
            String::from_utf8_lossy(&output.stderr)
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn lopdf_text(pdf: &Path) -> Result<String, lopdf::Error> {
    let doc = lopdf::Document::load(pdf)?;
    let mut text = String::new();

    for (page_num, _) in doc.get_pages() {
        if let Ok(page_text) = doc.extract_text(&[page_num]) {
            text.push_str(&page_text);
            text.push('\n');
        }
    }

    Ok(text)
}

/// Number of pages, or `None` when the PDF cannot be loaded.
pub fn page_count(pdf: &Path) -> Option<usize> {
    match lopdf::Document::load(pdf) {
        Ok(doc) => Some(doc.get_pages().len()),
        Err(e) => {
            tracing::warn!("Unable to determine PDF page count {}: {}", pdf.display(), e);
            None
        }
    }
}
