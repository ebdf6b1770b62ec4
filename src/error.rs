//! Generation errors.
//!
//! Every variant aborts the file being generated. There is no partial output.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Cannot print value of kind {kind}")]
    UnsupportedPrintable { kind: String },

    #[error("Import of {name} requested without a source path")]
    MissingSourcePath { name: String },

    #[error("Ran out of alias suffixes for {name}")]
    AliasExhaustion { name: String },

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Invalid plugin parameter: {0}")]
    InvalidParameter(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenerateError {
    pub fn unsupported(kind: impl Into<String>) -> Self {
        Self::UnsupportedPrintable { kind: kind.into() }
    }
}
