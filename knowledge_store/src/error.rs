//! Error types for the knowledge store.

use std::path::PathBuf;
use thiserror::Error;

use crate::AtomId;

/// Failure while reading Atomese text.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected end of input while reading form opened at byte {0}")]
    UnexpectedEof(usize),

    #[error("unterminated string starting at byte {0}")]
    UnterminatedString(usize),

    #[error("syntax error at byte {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("malformed truth value at byte {0}")]
    TruthValue(usize),
}

/// Failure of a store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("atom {0} is not in the store")]
    UnknownAtom(AtomId),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Syntax(#[from] ParseError),

    #[error("malformed query: {0}")]
    Query(String),
}
