//! Access to the persisted application configuration.
//!
//! The configuration database belongs to the host application. It is opened
//! read-only and no schema is created or changed here.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OpenFlags};

pub mod config_repo;
pub mod error;

pub use error::DatabaseError;

/// Shared read-only handle to the configuration database.
///
/// Cloning is cheap (inner `Arc`).
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens an existing database file without write access.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if !path.is_file() {
            return Err(DatabaseError::NotFound(path.to_path_buf()));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        log::info!("Configuration database opened read-only at {}", path.display());

        Ok(Self::from_connection(conn))
    }

    pub(crate) fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Provides locked access to the underlying connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

/// Returns the canonical database path: `~/.papocr/data/papocr.db`.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".papocr").join("data").join("papocr.db"))
}

/// Writable in-memory databases with the host application's schema.
#[cfg(test)]
pub(crate) mod fixture {
    use super::*;

    pub const SCHEMA: &str = r#"
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

    pub fn with_schema(schema: &str) -> Database {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(schema).unwrap();
        Database::from_connection(conn)
    }

    /// One empty configuration row.
    pub fn memory_db() -> Database {
        with_schema(SCHEMA)
    }

    pub fn execute(db: &Database, sql: &str) {
        db.with_conn(|conn| {
            conn.execute(sql, [])?;
            Ok(())
        })
        .unwrap();
    }
}
