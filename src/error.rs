use std::path::PathBuf;
use thiserror::Error;

/// Input tree violates the hierarchy rules. Raised before any layout is attempted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedInputError {
    #[error("leaf node '{path}' has no numeric value")]
    MissingValue { path: String },

    #[error("node '{path}' has a negative value: {value}")]
    NegativeValue { path: String, value: f64 },

    #[error("node '{path}' has a non-finite value")]
    NonFiniteValue { path: String },

    #[error("node '{path}' has a value that is not a number")]
    InvalidValue { path: String },

    #[error("node under '{path}' has no name")]
    MissingName { path: String },
}

/// Input document could not be read or parsed.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON input: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Malformed(#[from] MalformedInputError),

    #[error("no node at path '{0}'")]
    UnknownPath(String),

    #[error("node '{0}' has no children and cannot be focused")]
    NotZoomable(String),
}

pub type Result<T> = std::result::Result<T, Error>;
