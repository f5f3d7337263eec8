//! Owned atom trees used for loading, patterns and export.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Write};

use super::{AtomType, TruthValue};

/// An atom described by value rather than by handle.
///
/// Expressions are what the reader produces, what patterns and reasoner
/// targets are written in, and what the exporter serialises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Node {
        atom_type: AtomType,
        name: String,
        tv: Option<TruthValue>,
    },
    Link {
        atom_type: AtomType,
        outgoing: Vec<Expr>,
        tv: Option<TruthValue>,
    },
}

impl Expr {
    /// Create a node expression.
    pub fn node(atom_type: AtomType, name: impl Into<String>) -> Self {
        Expr::Node {
            atom_type,
            name: name.into(),
            tv: None,
        }
    }

    /// Create a link expression.
    pub fn link(atom_type: AtomType, outgoing: Vec<Expr>) -> Self {
        Expr::Link {
            atom_type,
            outgoing,
            tv: None,
        }
    }

    pub fn concept(name: impl Into<String>) -> Self {
        Self::node(AtomType::ConceptNode, name)
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::node(AtomType::VariableNode, name)
    }

    pub fn type_node(atom_type: &AtomType) -> Self {
        Self::node(AtomType::TypeNode, atom_type.name())
    }

    pub fn set(members: Vec<Expr>) -> Self {
        Self::link(AtomType::SetLink, members)
    }

    pub fn subset(a: Expr, b: Expr) -> Self {
        Self::link(AtomType::SubsetLink, vec![a, b])
    }

    /// Attach a truth value.
    pub fn with_tv(mut self, value: TruthValue) -> Self {
        match &mut self {
            Expr::Node { tv, .. } | Expr::Link { tv, .. } => *tv = Some(value),
        }
        self
    }

    pub fn atom_type(&self) -> &AtomType {
        match self {
            Expr::Node { atom_type, .. } | Expr::Link { atom_type, .. } => atom_type,
        }
    }

    pub fn tv(&self) -> Option<TruthValue> {
        match self {
            Expr::Node { tv, .. } | Expr::Link { tv, .. } => *tv,
        }
    }

    /// Node name, `None` for links.
    pub fn name(&self) -> Option<&str> {
        match self {
            Expr::Node { name, .. } => Some(name),
            Expr::Link { .. } => None,
        }
    }

    /// Outgoing set, empty for nodes.
    pub fn outgoing(&self) -> &[Expr] {
        match self {
            Expr::Node { .. } => &[],
            Expr::Link { outgoing, .. } => outgoing,
        }
    }

    /// Variable name if this is a `VariableNode`.
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Expr::Node {
                atom_type: AtomType::VariableNode,
                name,
                ..
            } => Some(name),
            _ => None,
        }
    }

    /// All variable names occurring anywhere in the tree.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut BTreeSet<String>) {
        if let Some(v) = self.as_variable() {
            out.insert(v.to_string());
        }
        for child in self.outgoing() {
            child.collect_variables(out);
        }
    }

    /// Serialise in indented Atomese, one atom per block, trailing newline.
    pub fn to_atomese(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_indented(&mut out, 0);
        out.push('\n');
        out
    }

    fn write_indented(&self, out: &mut String, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        match self {
            Expr::Node {
                atom_type,
                name,
                tv,
            } => {
                write!(out, "{}({} \"{}\"", pad, atom_type, escape(name))?;
                if let Some(tv) = tv.filter(|t| !t.is_default()) {
                    write!(out, " {}", tv)?;
                }
                out.push(')');
            }
            Expr::Link {
                atom_type,
                outgoing,
                tv,
            } => {
                write!(out, "{}({}", pad, atom_type)?;
                if let Some(tv) = tv.filter(|t| !t.is_default()) {
                    write!(out, " {}", tv)?;
                }
                out.push('\n');
                for child in outgoing {
                    child.write_indented(out, depth + 1)?;
                    out.push('\n');
                }
                write!(out, "{})", pad)?;
            }
        }
        Ok(())
    }
}

fn escape(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Compact single-line form, used in log messages.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Node {
                atom_type, name, ..
            } => write!(f, "({} \"{}\")", atom_type, escape(name)),
            Expr::Link {
                atom_type,
                outgoing,
                ..
            } => {
                write!(f, "({}", atom_type)?;
                for child in outgoing {
                    write!(f, " {}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}
