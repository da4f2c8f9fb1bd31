//! Reading course data and keeping the selection between runs.

use serde_json::Error as SerdeJsonError;
use std::collections::HashSet;
use std::fmt;
use std::io;

/// Failure while reading course rows, config files or stored selections.
#[derive(Debug)]
pub enum PersistenceError {
    /// Malformed JSON in a selection or config file.
    Json(SerdeJsonError),
    Io(io::Error),
    #[cfg(feature = "sqlite")]
    Sqlite(rusqlite::Error),
    /// Course CSV could not be read or written.
    Csv(csv::Error),
    /// A selection backend that cannot be used as configured.
    Store(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Json(err) => write!(f, "malformed JSON: {err}"),
            PersistenceError::Io(err) => write!(f, "file access failed: {err}"),
            #[cfg(feature = "sqlite")]
            PersistenceError::Sqlite(err) => write!(f, "selection database: {err}"),
            PersistenceError::Csv(err) => write!(f, "course CSV: {err}"),
            PersistenceError::Store(msg) => write!(f, "selection store: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::Json(err) => Some(err),
            PersistenceError::Io(err) => Some(err),
            #[cfg(feature = "sqlite")]
            PersistenceError::Sqlite(err) => Some(err),
            PersistenceError::Csv(err) => Some(err),
            PersistenceError::Store(_) => None,
        }
    }
}

impl From<SerdeJsonError> for PersistenceError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Json(value)
    }
}

impl From<io::Error> for PersistenceError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<csv::Error> for PersistenceError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Where the list of selected course names lives between runs.
pub trait SelectionStore {
    /// Returns the persisted names, or an empty set when nothing was stored yet.
    fn load_selection_names(&self) -> PersistenceResult<HashSet<String>>;
    /// Replaces the stored list with `names`, in order.
    fn save_selection_names(&self, names: &[String]) -> PersistenceResult<()>;
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{JsonSelectionStore, load_course_rows};
