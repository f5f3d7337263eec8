//! Reasoner module - the typed interface to the backward-chaining engine.
//!
//! The engine itself is an external collaborator. The pipeline describes
//! each invocation as a [`ChainerQuery`]: a rule set built from empty, a
//! target pattern, its variable declarations and the search bounds. Nothing
//! carries over from one query to the next, so rules loaded for one
//! invocation can never interact with those of another.

mod command;

pub use command::*;

use knowledge_store::{AtomId, AtomSpace, AtomType, Expr, ParseError, VariableDecl};
use log::warn;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while running the external engine.
#[derive(Debug, Error)]
pub enum ReasonerError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O with the reasoning engine failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not encode chainer request: {0}")]
    Request(#[from] serde_json::Error),

    #[error("reasoning engine exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    #[error("unreadable reasoning engine output: {0}")]
    Output(#[from] ParseError),
}

/// Rules available to one chaining call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rule_files: Vec<PathBuf>,
    rules: Vec<String>,
}

impl RuleSet {
    /// An empty rule set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Make the rules defined in a file available.
    pub fn load_from_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.rule_files.push(path.into());
        self
    }

    /// Activate a rule by name.
    pub fn with_rule(mut self, name: impl Into<String>) -> Self {
        self.rules.push(name.into());
        self
    }

    pub fn rule_files(&self) -> &[PathBuf] {
        &self.rule_files
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }
}

/// One bounded backward-chaining request.
#[derive(Debug, Clone)]
pub struct ChainerQuery {
    pub rule_set: RuleSet,
    pub target: Expr,
    pub vardecl: Vec<VariableDecl>,
    pub max_iterations: u32,
    pub complexity_penalty: f64,
}

impl ChainerQuery {
    /// Variable declaration as a `VariableSetLink`, if any variable is declared.
    pub fn vardecl_expr(&self) -> Option<Expr> {
        if self.vardecl.is_empty() {
            return None;
        }
        Some(Expr::link(
            AtomType::VariableSetLink,
            self.vardecl.iter().map(VariableDecl::to_expr).collect(),
        ))
    }
}

/// What a chaining call added to the store.
#[derive(Debug, Clone, Default)]
pub struct ChainerOutcome {
    pub derived: Vec<AtomId>,
}

/// A backward-chaining engine operating on the store.
pub trait Reasoner {
    /// Short name for log messages.
    fn name(&self) -> &str;

    /// Run one bounded backward-chaining call, inserting what it derives.
    fn backward_chain(
        &mut self,
        store: &mut AtomSpace,
        query: &ChainerQuery,
    ) -> Result<ChainerOutcome, ReasonerError>;
}

/// Stand-in for dry runs: derives nothing.
#[derive(Debug, Default)]
pub struct InertReasoner;

impl Reasoner for InertReasoner {
    fn name(&self) -> &str {
        "inert"
    }

    fn backward_chain(
        &mut self,
        _store: &mut AtomSpace,
        query: &ChainerQuery,
    ) -> Result<ChainerOutcome, ReasonerError> {
        warn!(
            "dry run; skipping {:?} on {}",
            query.rule_set.rules(),
            query.target
        );
        Ok(ChainerOutcome::default())
    }
}
