//! Atom module - the typed building blocks of the knowledge store.
//!
//! - **AtomType**: node and link types
//! - **TruthValue**: (strength, confidence) pairs
//! - **Expr**: atoms described by value
//! - **Atom / AtomId**: atoms as stored, referenced by handle

mod expr;
mod truth;
mod types;

pub use expr::*;
pub use truth::*;
pub use types::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique handle of an atom inside an [`crate::AtomSpace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AtomId(pub Uuid);

impl AtomId {
    /// Create a new random atom handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AtomId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AtomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An atom as held by the store: outgoing atoms are referenced by handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atom {
    pub id: AtomId,
    pub atom_type: AtomType,

    /// Name for nodes, empty for links.
    pub name: String,

    /// Outgoing set for links, empty for nodes.
    pub outgoing: Vec<AtomId>,

    pub tv: TruthValue,
}

impl Atom {
    pub fn is_node(&self) -> bool {
        self.atom_type.is_node()
    }

    /// A patient entity is a concept whose name is a numeric identifier.
    pub fn is_patient(&self) -> bool {
        self.atom_type == AtomType::ConceptNode && is_patient_identifier(&self.name)
    }
}

/// Patient identifiers are non-empty and purely numeric.
pub fn is_patient_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(char::is_numeric)
}
