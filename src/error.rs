//! Error types for catalog loading, reporting and the interactive server
//!
//! The weighted rating calculator itself never fails: missing or unparsable
//! values are folded into defaults. Errors only come from the outer layers
//! that touch the filesystem, parse CSV, or bind sockets.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write CSV: {0}")]
    CsvWrite(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no CSV files found under {0}")]
    NoCsvFiles(PathBuf),

    #[error("path does not exist: {0}")]
    NotFound(PathBuf),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("server error: {0}")]
    Server(String),
}

impl Error {
    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Error::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        fn fails() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"))?;
            Ok(())
        }

        let err = fails().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_messages_name_the_path() {
        let err = Error::NoCsvFiles(PathBuf::from("/data/albums"));
        assert_eq!(err.to_string(), "no CSV files found under /data/albums");

        let err = Error::NotFound(PathBuf::from("missing.csv"));
        assert!(err.to_string().contains("missing.csv"));
    }
}
