//! Run configuration.
//!
//! Values come from an optional TOML file; command-line flags override them.
//! Chaining bounds and rule names are fixed per run and live in
//! [`crate::inference`], not here.
//!
//! ```toml
//! data_path = "./cancer_data/"
//! output_path = "./results/cancer-2024-05-01/"
//! rules_dir = "rules"
//! dry_run = false
//!
//! [reasoner]
//! command = ["pln-bridge", "--quiet"]
//!
//! [embedding]
//! algorithm = "FMBPV"
//! entity_type = "patient"
//! command = ["generate-embeddings"]
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// Audit file listing patients dropped for lack of gene-expression evidence.
pub const FILTERED_OUT_FILE: &str = "filtered_out_patients.scm";

/// Export of all surviving subset links.
pub const SUBSET_LINKS_FILE: &str = "subset-links.scm";

/// Export of all derived attraction links.
pub const ATTRACTION_LINKS_FILE: &str = "attraction-links.scm";

/// Extension of knowledge-base source files.
pub const DATA_EXTENSION: &str = "scm";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory of knowledge-base source files.
    pub data_path: PathBuf,

    /// Results directory; a dated directory under `./results/` when unset.
    pub output_path: Option<PathBuf>,

    /// Directory holding the reasoner's rule files.
    pub rules_dir: PathBuf,

    /// Also drop subset links whose own truth value is vacuous before
    /// deriving attraction links.
    pub prune_vacuous_subsets: bool,

    /// Run without a reasoning engine: every chaining call derives nothing.
    pub dry_run: bool,

    pub reasoner: ReasonerConfig,

    pub embedding: EmbeddingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("./cancer_data/"),
            output_path: None,
            rules_dir: PathBuf::from("rules"),
            prune_vacuous_subsets: false,
            dry_run: false,
            reasoner: ReasonerConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

/// External reasoning engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// Program and arguments. Required unless `dry_run` is set.
    pub command: Vec<String>,
}

/// Downstream embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub algorithm: String,
    pub entity_type: String,

    /// Program and arguments; empty skips the stage.
    pub command: Vec<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            algorithm: "FMBPV".to_string(),
            entity_type: "patient".to_string(),
            command: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let text = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        Self::from_toml_str(&text).map_err(|source| PipelineError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the results directory for a run started on `today`.
    pub fn output_dir(&self, today: NaiveDate) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| default_output_dir(today))
    }
}

/// `./results/cancer-<YYYY-MM-DD>/`
pub fn default_output_dir(today: NaiveDate) -> PathBuf {
    PathBuf::from(format!("./results/cancer-{}/", today.format("%Y-%m-%d")))
}
