//! # Cohort Pipeline
//!
//! Drives the reasoning pipeline over patient gene-expression data held in a
//! [`knowledge_store::AtomSpace`]. The inference engine and the embedding
//! model are external collaborators; this crate sequences them and does the
//! filtering, statistics and export around them.
//!
//! ## Stages
//!
//! 1. **loader**: populate the store from the data directory
//! 2. **preprocess**: drop vacuous facts and patients without expression data
//! 3. **inference**: isolated backward-chaining calls deriving subset links
//! 4. **statistics**: truth values of derived subsets, then pruning
//! 5. **inference**: negation and attraction links
//! 6. **export**: subset and attraction links to files
//! 7. **embedding**: hand-off to the embedding generator

pub mod config;
pub mod embedding;
pub mod error;
pub mod export;
pub mod inference;
pub mod loader;
pub mod pipeline;
pub mod preprocess;
pub mod reasoner;
pub mod statistics;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use pipeline::{Pipeline, RunContext, RunSummary};
