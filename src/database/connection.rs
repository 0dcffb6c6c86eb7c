/*!
 * Database connection management.
 *
 * This module handles SQLite database connection creation and initialization.
 * One handle is opened per job; access is serialized through a mutex and the
 * storage engine handles any cross-process contention.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

use super::schema;

/// Default database directory name under user's data directory
const DEFAULT_DB_DIRNAME: &str = "booktrans";

/// Database connection wrapper with serialized access
pub struct DatabaseConnection {
    /// Path to the database file
    db_path: PathBuf,
    /// Connection guarded by a mutex
    connection: Mutex<Connection>,
}

impl DatabaseConnection {
    /// Create a new database connection at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
            }
        }

        info!("Opening database at: {:?}", db_path);

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {:?}", db_path))?;

        schema::initialize_schema(&conn)?;

        Ok(Self {
            db_path,
            connection: Mutex::new(conn),
        })
    }

    /// Create an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        debug!("Creating in-memory database");

        let conn =
            Connection::open_in_memory().context("Failed to create in-memory database")?;

        schema::initialize_schema(&conn)?;

        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            connection: Mutex::new(conn),
        })
    }

    /// Default location of a database file for the given file name
    pub fn default_database_path(filename: &str) -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(filename))
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Execute a database operation with the connection
    pub fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.connection.lock();
        f(&conn)
    }

    /// Close the connection, flushing any pending state
    pub fn close(self) -> Result<()> {
        let conn = self.connection.into_inner();
        conn.close()
            .map_err(|(_, e)| anyhow::anyhow!("Failed to close database {:?}: {}", self.db_path, e))
    }
}
