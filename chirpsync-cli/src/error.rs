//! CLI error type.

use thiserror::Error;

/// Anything that can abort a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file problem.
    #[error(transparent)]
    Config(#[from] chirpsync::config::ConfigFileError),

    /// Queue storage problem.
    #[error(transparent)]
    Persist(#[from] chirpsync::persist::PersistError),

    /// I/O problem (logging setup, signal handling).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
