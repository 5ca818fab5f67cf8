//! Error types shared by the store and the song service

use thiserror::Error;

/// SQLite primary result codes that mean another writer holds the database
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

#[derive(Error, Debug)]
pub enum Error {
    /// A required form field is missing or malformed
    #[error("Invalid input: {field} - {message}")]
    Validation { field: String, message: String },

    /// The referenced id does not exist in the store
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A concurrent mutation or duplicate broke an invariant
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn song_not_found(id: i64) -> Self {
        Self::NotFound { entity: "Song", id }
    }

    pub fn category_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "Category",
            id,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::Conflict(db_err.message().to_string());
            }

            // Extended result codes carry the primary code in the low byte
            let primary = db_err
                .code()
                .and_then(|code| code.parse::<i32>().ok())
                .map(|code| code & 0xff);
            if matches!(primary, Some(SQLITE_BUSY | SQLITE_LOCKED)) {
                return Self::Conflict(format!(
                    "catalog is being modified by another writer: {}",
                    db_err.message()
                ));
            }
        }
        Self::Database(err)
    }
}
