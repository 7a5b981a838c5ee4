// Error taxonomy for the bootstrap tool. Only `MissingTarget` is a
// configuration problem; the rest wrap filesystem or terminal failures
// that the tool does not try to recover from.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while resolving, reading or writing the passwords file.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Neither a base directory nor an explicit file path was given.
    #[error("Set AIRFLOW_HOME or pass --airflow-home/--passwords-file")]
    MissingTarget,

    #[error("failed to resolve {}: {source}", path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize credentials: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to read password from terminal: {0}")]
    Prompt(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BootstrapError>;
