//! Hand-off to the downstream embedding generator.

use knowledge_store::AtomSpace;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::PipelineError;

/// Snapshot of the store handed to an external embedder.
pub const ATOMSPACE_SNAPSHOT_FILE: &str = "atomspace.scm";

/// What the embedder is asked to produce.
#[derive(Debug, Clone)]
pub struct EmbeddingRequest<'a> {
    pub algorithm: &'a str,
    pub output_dir: &'a Path,
    pub entity_type: &'a str,
}

/// Generates embeddings from the exported links and the final store.
pub trait EmbeddingGenerator {
    fn generate(
        &mut self,
        request: &EmbeddingRequest<'_>,
        store: &AtomSpace,
    ) -> Result<(), PipelineError>;
}

/// Runs an external embedding program.
///
/// The store is written to [`ATOMSPACE_SNAPSHOT_FILE`] in the output
/// directory and the program is invoked as
/// `<program> <args...> --algorithm A --output DIR --entity-type T --atomspace FILE`.
#[derive(Debug, Clone)]
pub struct CommandEmbedder {
    program: String,
    args: Vec<String>,
}

impl CommandEmbedder {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a `[program, args...]` list; `None` when the list is empty.
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    fn command(&self, request: &EmbeddingRequest<'_>, snapshot: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("--algorithm")
            .arg(request.algorithm)
            .arg("--output")
            .arg(request.output_dir)
            .arg("--entity-type")
            .arg(request.entity_type)
            .arg("--atomspace")
            .arg(snapshot);
        cmd
    }
}

impl EmbeddingGenerator for CommandEmbedder {
    fn generate(
        &mut self,
        request: &EmbeddingRequest<'_>,
        store: &AtomSpace,
    ) -> Result<(), PipelineError> {
        let snapshot: PathBuf = request.output_dir.join(ATOMSPACE_SNAPSHOT_FILE);
        fs::write(&snapshot, store.dump()).map_err(|e| PipelineError::io(&snapshot, e))?;

        info!(
            "--- Generating {} embeddings for {} with {}",
            request.algorithm, request.entity_type, self.program
        );
        let status = self.command(request, &snapshot).status().map_err(|e| {
            PipelineError::Embedding(format!("failed to start {}: {}", self.program, e))
        })?;

        if !status.success() {
            return Err(PipelineError::Embedding(format!(
                "{} exited with {}",
                self.program, status
            )));
        }
        Ok(())
    }
}
