//! CLI error types

use controlpath_native::{ClientError, CompilerError, RepositoryError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Compiler error: {0}")]
    Compiler(#[from] CompilerError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("{0}")]
    Client(#[from] ClientError),

    #[error("Invalid project config: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("Toolchain command `{command}` failed ({status}): {stderr}")]
    Toolchain {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("{0}")]
    Message(String),
}

impl From<controlpath_native::parser::ParseError> for CliError {
    fn from(err: controlpath_native::parser::ParseError) -> Self {
        Self::Compiler(err.into())
    }
}

pub type CliResult<T> = Result<T, CliError>;
