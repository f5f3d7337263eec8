//! # Knowledge Store
//!
//! The typed knowledge graph the cohort pipeline reads, filters and scores.
//! This crate holds atoms and their truth values and answers pattern
//! queries; it contains no pipeline logic and no inference rules.
//!
//! ## Core Components
//!
//! - **atom**: atom types, truth values, atom expressions and handles
//! - **parser**: the Atomese reader used for data files and reasoner output
//! - **space**: the AtomSpace store and its pattern queries

pub mod atom;
pub mod error;
pub mod parser;
pub mod space;

pub use atom::*;
pub use error::*;
pub use parser::*;
pub use space::*;
