//! Fixture builders for documents fed to the parser.

#![allow(dead_code)]

use std::path::Path;

use lopdf::{dictionary, Document, Object, Stream};

/// Text long enough to count as an existing text layer.
pub const LONG_TEXT: &str = "This document already has a proper text layer with many words";

/// Writes a PDF with one page per entry. Empty entries produce pages
/// without any text operators, like a scan.
pub fn write_pdf(path: &Path, pages: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for text in pages {
        let content = if text.is_empty() {
            "0 0 m 10 10 l S".to_string()
        } else {
            format!("BT /F1 10 Tf 20 700 Td ({}) Tj ET", text)
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("Failed to write PDF fixture");
}

/// Writes a grayscale TIFF storing `dpi` as its resolution in inches.
pub fn write_tiff(path: &Path, width: u32, height: u32, dpi: u32) {
    use tiff::encoder::{colortype, Rational, TiffEncoder};

    let file = std::fs::File::create(path).expect("Failed to create TIFF fixture");
    let mut encoder = TiffEncoder::new(file).expect("Failed to start TIFF fixture");
    let mut image = encoder
        .new_image::<colortype::Gray8>(width, height)
        .expect("Failed to start TIFF image");
    image.resolution(tiff::tags::ResolutionUnit::Inch, Rational { n: dpi, d: 1 });
    image
        .write_data(&vec![255u8; (width * height) as usize])
        .expect("Failed to write TIFF fixture");
}

/// Schema of the host application's configuration table, with one empty row.
pub const CONFIG_SCHEMA: &str = r#"
    CREATE TABLE application_configuration (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        output_type TEXT,
        pages INTEGER,
        language TEXT,
        mode TEXT,
        skip_archive_file TEXT,
        image_dpi INTEGER,
        unpaper_clean TEXT,
        deskew INTEGER,
        rotate_pages INTEGER,
        rotate_pages_threshold REAL,
        max_image_pixels REAL,
        color_conversion_strategy TEXT,
        user_args TEXT
    );
    INSERT INTO application_configuration (id) VALUES (1);
"#;

/// Creates a configuration database file the way the host application would.
pub fn write_config_db(path: &Path, schema: &str) {
    let conn = rusqlite::Connection::open(path).expect("Failed to create database fixture");
    conn.execute_batch(schema)
        .expect("Failed to create configuration schema");
}

/// Runs a statement through a separate writable connection.
pub fn execute_sql(path: &Path, sql: &str) {
    let conn = rusqlite::Connection::open(path).expect("Failed to open database fixture");
    conn.execute(sql, []).expect("Failed to update database fixture");
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}

/// Builder for PNG fixtures.
pub struct PngBuilder {
    width: u32,
    height: u32,
    alpha: bool,
    dpi: Option<u32>,
}

impl PngBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            alpha: false,
            dpi: None,
        }
    }

    pub fn alpha(mut self) -> Self {
        self.alpha = true;
        self
    }

    /// Stores the resolution in a `pHYs` chunk.
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.dpi = Some(dpi);
        self
    }

    pub fn write(&self, path: &Path) {
        let mut bytes = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut bytes);
        let color = if self.alpha {
            image::ExtendedColorType::Rgba8
        } else {
            image::ExtendedColorType::Rgb8
        };
        let channels = if self.alpha { 4 } else { 3 };
        let pixels = vec![255u8; (self.width * self.height * channels) as usize];
        image::ImageEncoder::write_image(encoder, &pixels, self.width, self.height, color)
            .expect("Failed to encode PNG fixture");

        if let Some(dpi) = self.dpi {
            let per_meter = (dpi as f64 / 0.0254).round() as u32;
            let mut chunk = b"pHYs".to_vec();
            chunk.extend_from_slice(&per_meter.to_be_bytes());
            chunk.extend_from_slice(&per_meter.to_be_bytes());
            chunk.push(1);

            let mut encoded = 9u32.to_be_bytes().to_vec();
            encoded.extend_from_slice(&chunk);
            encoded.extend_from_slice(&crc32(&chunk).to_be_bytes());

            // signature (8) + IHDR chunk (25)
            bytes.splice(33..33, encoded);
        }

        std::fs::write(path, bytes).expect("Failed to write PNG fixture");
    }
}
