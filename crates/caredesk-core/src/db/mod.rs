//! Database layer for CareDesk.
//!
//! SQLite is the system of record. It fills in timestamps, default statuses
//! and business identifiers, and enforces referential and uniqueness
//! constraints. Storage keys are minted here as UUIDs.

mod schema;
mod assign;
mod expand;
mod patients;
mod ambulance;
mod appointments;
mod prescriptions;

pub use schema::*;
pub use expand::PatientExpansion;

use rusqlite::{Connection, ErrorCode};
use std::path::Path;
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    /// The store could not serve the request. The underlying error is kept as-is.
    #[error("Store unavailable: {0}")]
    Unavailable(#[source] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                DbError::Constraint(
                    message
                        .clone()
                        .unwrap_or_else(|| failure.to_string()),
                )
            }
            _ => DbError::Unavailable(err),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        tracing::debug!("schema initialized");
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Storage keys are opaque UUIDs minted when a row is created.
pub(crate) fn new_storage_key() -> String {
    uuid::Uuid::new_v4().to_string()
}
