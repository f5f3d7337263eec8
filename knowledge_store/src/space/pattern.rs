//! Pattern queries over the store.
//!
//! A pattern is an [`Expr`] in which `VariableNode`s stand for any atom.
//! Each clause of a query must match a stored atom; variables bind
//! consistently across clauses. This is what executing a `Get` (or a
//! satisfying-set scope) amounts to.
//!
//! Patterns are themselves stored in the store (inside subset links, for
//! instance), so a variable never grounds to a `VariableNode`; otherwise a
//! scope would match its own body.

use std::collections::{BTreeMap, HashSet};

use super::AtomSpace;
use crate::atom::{AtomId, AtomType, Expr};
use crate::error::StoreError;

/// Variable name -> grounding.
pub type Bindings = BTreeMap<String, AtomId>;

/// A declared variable, optionally restricted to one atom type.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub name: String,
    pub atom_type: Option<AtomType>,
}

impl VariableDecl {
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            atom_type: None,
        }
    }

    pub fn typed(name: impl Into<String>, atom_type: AtomType) -> Self {
        Self {
            name: name.into(),
            atom_type: Some(atom_type),
        }
    }

    /// Read a variable declaration: a `VariableNode`, a `TypedVariableLink`,
    /// or a `VariableListLink`/`VariableSetLink` of those.
    pub fn from_expr(expr: &Expr) -> Result<Vec<Self>, StoreError> {
        if let Some(name) = expr.as_variable() {
            return Ok(vec![Self::untyped(name)]);
        }

        match expr.atom_type() {
            AtomType::TypedVariableLink => match expr.outgoing() {
                [var, ty] => {
                    let name = var.as_variable().ok_or_else(|| {
                        StoreError::Query(format!("{} does not declare a variable", expr))
                    })?;
                    let type_name = match ty {
                        Expr::Node {
                            atom_type: AtomType::TypeNode,
                            name,
                            ..
                        } => name,
                        _ => {
                            return Err(StoreError::Query(format!(
                                "{} has no type restriction",
                                expr
                            )))
                        }
                    };
                    Ok(vec![Self::typed(name, AtomType::from_name(type_name, true))])
                }
                _ => Err(StoreError::Query(format!("malformed declaration {}", expr))),
            },
            AtomType::VariableListLink | AtomType::VariableSetLink => {
                let mut decls = Vec::new();
                for child in expr.outgoing() {
                    decls.extend(Self::from_expr(child)?);
                }
                Ok(decls)
            }
            _ => Err(StoreError::Query(format!("{} is not a variable declaration", expr))),
        }
    }

    /// Declaration expression: plain variable or typed variable link.
    pub fn to_expr(&self) -> Expr {
        match &self.atom_type {
            None => Expr::var(&self.name),
            Some(t) => Expr::link(
                AtomType::TypedVariableLink,
                vec![Expr::var(&self.name), Expr::type_node(t)],
            ),
        }
    }
}

impl AtomSpace {
    /// Match one clause against the store, extending `bindings`.
    pub fn match_pattern(&self, pattern: &Expr, bindings: &Bindings) -> Vec<Bindings> {
        if let Some(var) = pattern.as_variable() {
            // A bare variable clause only checks an existing binding.
            return match bindings.get(var) {
                Some(id) if self.contains(*id) => vec![bindings.clone()],
                _ => Vec::new(),
            };
        }

        let candidates = match pattern {
            Expr::Node {
                atom_type, name, ..
            } => self.find_node(atom_type, name).into_iter().collect(),
            Expr::Link { atom_type, .. } => self.atoms_by_type(atom_type),
        };

        candidates
            .into_iter()
            .filter_map(|id| {
                let mut extended = bindings.clone();
                self.unify(pattern, id, &mut extended).then_some(extended)
            })
            .collect()
    }

    /// Conjunctive query: every clause must match under shared bindings.
    pub fn query(&self, clauses: &[Expr]) -> Vec<Bindings> {
        let mut results = vec![Bindings::new()];

        for clause in clauses {
            results = results
                .iter()
                .flat_map(|bindings| self.match_pattern(clause, bindings))
                .collect();
            if results.is_empty() {
                break;
            }
        }

        results
    }

    /// Distinct groundings of the declared variables that satisfy `body`.
    ///
    /// An `AndLink` body is a conjunction of clauses. Variables that occur in
    /// the body but are not declared are matched existentially.
    pub fn execute_get(
        &self,
        vardecl: &[VariableDecl],
        body: &Expr,
    ) -> Result<Vec<Vec<AtomId>>, StoreError> {
        let body_vars = body.variables();
        if let Some(missing) = vardecl.iter().find(|d| !body_vars.contains(&d.name)) {
            return Err(StoreError::Query(format!(
                "variable {} does not occur in {}",
                missing.name, body
            )));
        }

        let clauses = match body.atom_type() {
            AtomType::AndLink => body.outgoing().to_vec(),
            _ => vec![body.clone()],
        };

        let mut seen = HashSet::new();
        let mut groundings = Vec::new();

        for bindings in self.query(&clauses) {
            let tuple: Option<Vec<AtomId>> = vardecl
                .iter()
                .map(|decl| {
                    let id = *bindings.get(&decl.name)?;
                    match &decl.atom_type {
                        Some(t) if self.get(id)?.atom_type != *t => None,
                        _ => Some(id),
                    }
                })
                .collect();

            if let Some(tuple) = tuple {
                if seen.insert(tuple.clone()) {
                    groundings.push(tuple);
                }
            }
        }

        Ok(groundings)
    }

    /// Execute a scope expression (`SatisfyingSetScopeLink`, `GetLink`, ...):
    /// `(Scope vardecl body)`, or `(Scope body)` with every variable free.
    pub fn execute_scope(&self, scope: &Expr) -> Result<Vec<Vec<AtomId>>, StoreError> {
        match scope.outgoing() {
            [body] => {
                let decls: Vec<_> = body
                    .variables()
                    .into_iter()
                    .map(VariableDecl::untyped)
                    .collect();
                self.execute_get(&decls, body)
            }
            [vardecl, body] => self.execute_get(&VariableDecl::from_expr(vardecl)?, body),
            _ => Err(StoreError::Query(format!(
                "{} is not a scope with a body",
                scope
            ))),
        }
    }

    fn unify(&self, pattern: &Expr, id: AtomId, bindings: &mut Bindings) -> bool {
        let Some(atom) = self.get(id) else {
            return false;
        };

        if let Some(var) = pattern.as_variable() {
            // Variables of stored patterns are never groundings.
            if atom.atom_type == AtomType::VariableNode {
                return false;
            }
            return match bindings.get(var) {
                Some(bound) => *bound == id,
                None => {
                    bindings.insert(var.to_string(), id);
                    true
                }
            };
        }
        if atom.atom_type != *pattern.atom_type() {
            return false;
        }

        match pattern {
            Expr::Node { name, .. } => atom.name == *name,
            Expr::Link { outgoing, .. } => {
                outgoing.len() == atom.outgoing.len()
                    && outgoing
                        .iter()
                        .zip(&atom.outgoing)
                        .all(|(p, child)| self.unify(p, *child, bindings))
            }
        }
    }
}
