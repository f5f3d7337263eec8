//! Atom type definitions - the vocabulary of nodes and links in the store.

use serde::{Deserialize, Serialize};

/// The type of an atom.
///
/// Well-known types used by the cohort data files and reasoning rules are
/// enumerated; anything else is carried through as [`AtomType::OtherNode`]
/// or [`AtomType::OtherLink`] so that loading never loses information.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtomType {
    // Nodes
    ConceptNode,
    PredicateNode,
    GeneNode,
    SchemaNode,
    VariableNode,
    TypeNode,

    // Links
    EvaluationLink,
    LazyExecutionOutputLink,
    ExecutionOutputLink,
    SubsetLink,
    AttractionLink,
    SetLink,
    NotLink,
    AndLink,
    OrLink,
    SatisfyingSetScopeLink,
    SatisfyingSetLink,
    ListLink,
    InheritanceLink,
    MemberLink,
    TypedVariableLink,
    VariableListLink,
    VariableSetLink,
    GetLink,

    /// Node type not in the list above, stored by full name.
    OtherNode(String),

    /// Link type not in the list above, stored by full name.
    OtherLink(String),
}

const KNOWN: &[(&str, AtomType)] = &[
    ("ConceptNode", AtomType::ConceptNode),
    ("PredicateNode", AtomType::PredicateNode),
    ("GeneNode", AtomType::GeneNode),
    ("SchemaNode", AtomType::SchemaNode),
    ("VariableNode", AtomType::VariableNode),
    ("TypeNode", AtomType::TypeNode),
    ("EvaluationLink", AtomType::EvaluationLink),
    ("LazyExecutionOutputLink", AtomType::LazyExecutionOutputLink),
    ("ExecutionOutputLink", AtomType::ExecutionOutputLink),
    ("SubsetLink", AtomType::SubsetLink),
    ("AttractionLink", AtomType::AttractionLink),
    ("SetLink", AtomType::SetLink),
    ("NotLink", AtomType::NotLink),
    ("AndLink", AtomType::AndLink),
    ("OrLink", AtomType::OrLink),
    ("SatisfyingSetScopeLink", AtomType::SatisfyingSetScopeLink),
    ("SatisfyingSetLink", AtomType::SatisfyingSetLink),
    ("ListLink", AtomType::ListLink),
    ("InheritanceLink", AtomType::InheritanceLink),
    ("MemberLink", AtomType::MemberLink),
    ("TypedVariableLink", AtomType::TypedVariableLink),
    ("VariableListLink", AtomType::VariableListLink),
    ("VariableSetLink", AtomType::VariableSetLink),
    ("GetLink", AtomType::GetLink),
];

impl AtomType {
    /// Resolve a type name as written in Atomese.
    ///
    /// Accepts both the full name (`SubsetLink`) and the short alias
    /// (`Subset`). `is_node` decides the kind when the name carries no
    /// `Node`/`Link` suffix.
    pub fn from_name(name: &str, is_node: bool) -> Self {
        let full = if name.ends_with("Node") || name.ends_with("Link") {
            name.to_string()
        } else if is_node {
            format!("{}Node", name)
        } else {
            format!("{}Link", name)
        };

        if let Some((_, t)) = KNOWN.iter().find(|(n, _)| *n == full) {
            return t.clone();
        }

        if full.ends_with("Node") {
            AtomType::OtherNode(full)
        } else {
            AtomType::OtherLink(full)
        }
    }

    /// Full type name, e.g. `ConceptNode`.
    pub fn name(&self) -> &str {
        match self {
            AtomType::OtherNode(s) | AtomType::OtherLink(s) => s,
            known => KNOWN
                .iter()
                .find(|(_, t)| t == known)
                .map(|(n, _)| *n)
                .unwrap_or("UnknownLink"),
        }
    }

    /// Whether atoms of this type are nodes (named, no outgoing set).
    pub fn is_node(&self) -> bool {
        matches!(
            self,
            AtomType::ConceptNode
                | AtomType::PredicateNode
                | AtomType::GeneNode
                | AtomType::SchemaNode
                | AtomType::VariableNode
                | AtomType::TypeNode
                | AtomType::OtherNode(_)
        )
    }

    /// Whether atoms of this type are links.
    pub fn is_link(&self) -> bool {
        !self.is_node()
    }

    /// Links whose outgoing set has no order.
    pub fn is_unordered(&self) -> bool {
        matches!(self, AtomType::SetLink)
    }
}

impl std::fmt::Display for AtomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
