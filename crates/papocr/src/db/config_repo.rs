//! Read-only access to the `application_configuration` table.

use std::collections::HashSet;
use std::str::FromStr;

use rusqlite::types::FromSql;
use rusqlite::{Connection, Row};
use serde_json::{Map, Value};

use super::{Database, DatabaseError};
use crate::config::ApplicationConfiguration;

/// A raw configuration row as stored. Enum columns are plain text.
///
/// Columns missing from an older schema read as unset.
#[derive(Debug, Clone, Default)]
pub struct ConfigRow {
    pub id: Option<i64>,
    pub output_type: Option<String>,
    pub pages: Option<i64>,
    pub language: Option<String>,
    pub mode: Option<String>,
    pub skip_archive_file: Option<String>,
    pub image_dpi: Option<i64>,
    pub unpaper_clean: Option<String>,
    pub deskew: Option<bool>,
    pub rotate_pages: Option<bool>,
    pub rotate_pages_threshold: Option<f64>,
    pub max_image_pixels: Option<f64>,
    pub color_conversion_strategy: Option<String>,
    pub user_args: Option<String>,
}

impl ConfigRow {
    fn from_row(row: &Row<'_>, columns: &HashSet<String>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: read_column(row, columns, "id")?,
            output_type: read_column(row, columns, "output_type")?,
            pages: read_column(row, columns, "pages")?,
            language: read_column(row, columns, "language")?,
            mode: read_column(row, columns, "mode")?,
            skip_archive_file: read_column(row, columns, "skip_archive_file")?,
            image_dpi: read_column(row, columns, "image_dpi")?,
            unpaper_clean: read_column(row, columns, "unpaper_clean")?,
            deskew: read_column(row, columns, "deskew")?,
            rotate_pages: read_column(row, columns, "rotate_pages")?,
            rotate_pages_threshold: read_column(row, columns, "rotate_pages_threshold")?,
            max_image_pixels: read_column(row, columns, "max_image_pixels")?,
            color_conversion_strategy: read_column(row, columns, "color_conversion_strategy")?,
            user_args: read_column(row, columns, "user_args")?,
        })
    }

    /// Converts text columns into their typed form.
    pub fn into_configuration(self) -> Result<ApplicationConfiguration, DatabaseError> {
        Ok(ApplicationConfiguration {
            id: self.id,
            pages: positive(self.pages),
            language: self.language,
            output_type: decode_enum("output_type", self.output_type)?,
            mode: decode_enum("mode", self.mode)?,
            skip_archive_file: decode_enum("skip_archive_file", self.skip_archive_file)?,
            image_dpi: positive(self.image_dpi),
            unpaper_clean: decode_enum("unpaper_clean", self.unpaper_clean)?,
            deskew: self.deskew,
            rotate_pages: self.rotate_pages,
            rotate_pages_threshold: self.rotate_pages_threshold,
            max_image_pixels: self.max_image_pixels,
            color_conversion_strategy: decode_enum(
                "color_conversion_strategy",
                self.color_conversion_strategy,
            )?,
            user_args: decode_user_args(self.user_args)?,
        })
    }
}

fn read_column<T: FromSql>(
    row: &Row<'_>,
    columns: &HashSet<String>,
    name: &str,
) -> Result<Option<T>, rusqlite::Error> {
    if columns.contains(name) {
        row.get(name)
    } else {
        Ok(None)
    }
}

/// Zero, negative and out of range counts are unset.
fn positive(value: Option<i64>) -> Option<u32> {
    value
        .filter(|v| *v > 0)
        .and_then(|v| u32::try_from(v).ok())
}

/// Empty strings are treated as unset, like NULL.
fn decode_enum<T>(column: &str, value: Option<String>) -> Result<Option<T>, DatabaseError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value.filter(|v| !v.trim().is_empty()) {
        None => Ok(None),
        Some(v) => v.parse().map(Some).map_err(|e: T::Err| DatabaseError::Decode {
            column: column.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn decode_user_args(value: Option<String>) -> Result<Option<Map<String, Value>>, DatabaseError> {
    match value.filter(|v| !v.trim().is_empty()) {
        None => Ok(None),
        Some(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            Ok(Value::Null) => Ok(None),
            Ok(other) => Err(DatabaseError::Decode {
                column: "user_args".to_string(),
                reason: format!("expected a JSON object, found {}", other),
            }),
            Err(e) => Err(DatabaseError::Decode {
                column: "user_args".to_string(),
                reason: e.to_string(),
            }),
        },
    }
}

fn table_columns(conn: &Connection) -> Result<HashSet<String>, rusqlite::Error> {
    let mut stmt =
        conn.prepare("SELECT name FROM pragma_table_info('application_configuration')")?;
    let names = stmt.query_map([], |r| r.get::<_, String>(0))?;
    names.collect()
}

/// Returns the first raw configuration row, if any.
///
/// A database without the `application_configuration` table has no row.
pub fn find_first_row(db: &Database) -> Result<Option<ConfigRow>, DatabaseError> {
    db.with_conn(|conn| {
        let columns = table_columns(conn)?;
        if columns.is_empty() {
            log::debug!("No application_configuration table, using settings only");
            return Ok(None);
        }

        let mut stmt =
            conn.prepare("SELECT * FROM application_configuration ORDER BY rowid ASC LIMIT 1")?;
        let mut rows = stmt.query_map([], |row| ConfigRow::from_row(row, &columns))?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Returns the first configuration record, typed.
pub fn find_first(db: &Database) -> Result<Option<ApplicationConfiguration>, DatabaseError> {
    find_first_row(db)?
        .map(ConfigRow::into_configuration)
        .transpose()
}
