//! Error taxonomy for statement rendering and execution.
//!
//! - [`Error::Config`]: empty schema, unset table name, or a malformed setting
//!   discovered when a statement is rendered.
//! - [`Error::Schema`]: a column rule is invalid or a referenced column is not
//!   part of the schema.
//! - [`Error::Execution`]: whatever the execution collaborator returned,
//!   carried through untouched.

use std::{error::Error as StdError, fmt};

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub(crate) fn schema(message: impl Into<String>) -> Self {
        Error::Schema(message.into())
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, Error::Schema(_))
    }
}

/// Opaque failure reported by an [`Executor`](crate::executor::Executor).
#[derive(Debug)]
pub struct ExecutionError(Box<dyn StdError + Send + Sync + 'static>);

impl ExecutionError {
    pub fn new<E>(source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        ExecutionError(source.into())
    }

    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync + 'static> {
        self.0
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for ExecutionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<std::io::Error> for ExecutionError {
    fn from(err: std::io::Error) -> Self {
        ExecutionError::new(err)
    }
}
