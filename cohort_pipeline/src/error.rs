//! Error types for the pipeline.

use knowledge_store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

use crate::reasoner::ReasonerError;

/// A failure that aborts the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("data directory {0} does not exist or is not a directory")]
    MissingDataDir(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("no reasoning engine configured; set [reasoner] command, or dry_run = true")]
    NoReasoner,

    #[error("reasoner failed: {0}")]
    Reasoner(#[from] ReasonerError),

    #[error("embedding generation failed: {0}")]
    Embedding(String),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}
