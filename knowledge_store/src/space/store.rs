//! The AtomSpace - in-memory store of hash-consed atoms.

use log::{debug, trace};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::atom::{Atom, AtomId, AtomType, Expr, TruthValue};
use crate::error::StoreError;
use crate::parser::parse_atomese;

/// Identity of an atom: two atoms with the same key are the same atom.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum AtomKey {
    Node(AtomType, String),
    Link(AtomType, Vec<AtomId>),
}

/// The main store structure.
///
/// Every atom is unique: adding a node with an existing type and name, or a
/// link with an existing type and outgoing set, returns the existing handle.
/// Lookups by handle, by type and by incoming set are all indexed.
#[derive(Debug, Clone, Default)]
pub struct AtomSpace {
    /// All atoms stored by handle.
    atoms: HashMap<AtomId, Atom>,

    /// Index: identity -> handle.
    index: HashMap<AtomKey, AtomId>,

    /// Index: type -> handles in insertion order.
    by_type: HashMap<AtomType, BTreeMap<u64, AtomId>>,

    /// Insertion sequence of each atom.
    sequence: HashMap<AtomId, u64>,

    /// Reverse index: atom -> links that contain it.
    incoming: HashMap<AtomId, HashSet<AtomId>>,

    next_sequence: u64,
}

impl AtomSpace {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an atom tree, returning the handle of its root.
    ///
    /// Truth values carried by the expression overwrite stored ones.
    pub fn add(&mut self, expr: &Expr) -> AtomId {
        let id = match expr {
            Expr::Node {
                atom_type, name, ..
            } => self.insert(AtomKey::Node(atom_type.clone(), name.clone())),
            Expr::Link {
                atom_type,
                outgoing,
                ..
            } => {
                let children = outgoing.iter().map(|child| self.add(child)).collect();
                let key = self.link_key(atom_type.clone(), children);
                self.insert(key)
            }
        };

        if let (Some(tv), Some(atom)) = (expr.tv(), self.atoms.get_mut(&id)) {
            atom.tv = tv;
        }
        id
    }

    /// Add a node by type and name.
    pub fn add_node(&mut self, atom_type: AtomType, name: impl Into<String>) -> AtomId {
        self.insert(AtomKey::Node(atom_type, name.into()))
    }

    /// Add a link over atoms already in the store.
    pub fn add_link(
        &mut self,
        atom_type: AtomType,
        outgoing: Vec<AtomId>,
    ) -> Result<AtomId, StoreError> {
        if let Some(missing) = outgoing.iter().find(|id| !self.atoms.contains_key(id)) {
            return Err(StoreError::UnknownAtom(*missing));
        }
        let key = self.link_key(atom_type, outgoing);
        Ok(self.insert(key))
    }

    /// Identity of a link. Members of an unordered link are kept in the
    /// insertion order of the member atoms, so `(Set 2 1)` and `(Set 1 2)`
    /// are the same atom.
    fn link_key(&self, atom_type: AtomType, mut outgoing: Vec<AtomId>) -> AtomKey {
        if atom_type.is_unordered() {
            outgoing.sort_by_key(|id| self.sequence.get(id).copied().unwrap_or(u64::MAX));
        }
        AtomKey::Link(atom_type, outgoing)
    }

    fn insert(&mut self, key: AtomKey) -> AtomId {
        if let Some(id) = self.index.get(&key) {
            return *id;
        }

        let id = AtomId::new();
        let atom = match &key {
            AtomKey::Node(atom_type, name) => Atom {
                id,
                atom_type: atom_type.clone(),
                name: name.clone(),
                outgoing: Vec::new(),
                tv: TruthValue::default(),
            },
            AtomKey::Link(atom_type, outgoing) => Atom {
                id,
                atom_type: atom_type.clone(),
                name: String::new(),
                outgoing: outgoing.clone(),
                tv: TruthValue::default(),
            },
        };

        for child in &atom.outgoing {
            self.incoming.entry(*child).or_default().insert(id);
        }

        let seq = self.next_sequence;
        self.next_sequence += 1;
        self.sequence.insert(id, seq);
        self.by_type
            .entry(atom.atom_type.clone())
            .or_default()
            .insert(seq, id);

        trace!("added {} {}", atom.atom_type, id);
        self.atoms.insert(id, atom);
        self.index.insert(key, id);
        id
    }

    /// Get atom by handle.
    pub fn get(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(&id)
    }

    /// Check whether a handle is live.
    pub fn contains(&self, id: AtomId) -> bool {
        self.atoms.contains_key(&id)
    }

    pub fn tv(&self, id: AtomId) -> Option<TruthValue> {
        self.atoms.get(&id).map(|a| a.tv)
    }

    /// Replace the truth value of an atom.
    pub fn set_tv(&mut self, id: AtomId, tv: TruthValue) -> Result<(), StoreError> {
        let atom = self.atoms.get_mut(&id).ok_or(StoreError::UnknownAtom(id))?;
        atom.tv = tv;
        Ok(())
    }

    /// All atoms of exactly the given type, in insertion order.
    pub fn atoms_by_type(&self, atom_type: &AtomType) -> Vec<AtomId> {
        self.by_type
            .get(atom_type)
            .map(|ids| ids.values().copied().collect())
            .unwrap_or_default()
    }

    /// Links whose outgoing set contains the atom.
    pub fn incoming(&self, id: AtomId) -> Vec<AtomId> {
        let mut ids: Vec<_> = self
            .incoming
            .get(&id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        ids.sort_by_key(|i| self.sequence.get(i).copied().unwrap_or(u64::MAX));
        ids
    }

    /// Find a node by type and name.
    pub fn find_node(&self, atom_type: &AtomType, name: &str) -> Option<AtomId> {
        self.index
            .get(&AtomKey::Node(atom_type.clone(), name.to_string()))
            .copied()
    }

    /// Find a link by type and outgoing set.
    pub fn find_link(&self, atom_type: &AtomType, outgoing: &[AtomId]) -> Option<AtomId> {
        self.index
            .get(&self.link_key(atom_type.clone(), outgoing.to_vec()))
            .copied()
    }

    /// Find the stored atom equal to an expression, ignoring truth values.
    pub fn find(&self, expr: &Expr) -> Option<AtomId> {
        match expr {
            Expr::Node {
                atom_type, name, ..
            } => self.find_node(atom_type, name),
            Expr::Link {
                atom_type,
                outgoing,
                ..
            } => {
                let children = outgoing
                    .iter()
                    .map(|child| self.find(child))
                    .collect::<Option<Vec<_>>>()?;
                self.find_link(atom_type, &children)
            }
        }
    }

    /// Rebuild the expression of a stored atom, truth values included.
    pub fn to_expr(&self, id: AtomId) -> Option<Expr> {
        let atom = self.atoms.get(&id)?;
        let expr = if atom.is_node() {
            Expr::node(atom.atom_type.clone(), atom.name.clone())
        } else {
            let children = atom
                .outgoing
                .iter()
                .map(|child| self.to_expr(*child))
                .collect::<Option<Vec<_>>>()?;
            Expr::link(atom.atom_type.clone(), children)
        };
        Some(expr.with_tv(atom.tv))
    }

    /// Remove an atom.
    ///
    /// Without `recursive`, an atom that is still referenced by a link is
    /// kept and 0 is returned. With `recursive`, every link referencing it is
    /// removed as well, transitively. Returns the number of atoms removed.
    pub fn remove(&mut self, id: AtomId, recursive: bool) -> Result<usize, StoreError> {
        if !self.atoms.contains_key(&id) {
            return Err(StoreError::UnknownAtom(id));
        }

        let has_incoming = self.incoming.get(&id).is_some_and(|s| !s.is_empty());
        if has_incoming && !recursive {
            debug!("refusing to remove {}: still referenced", id);
            return Ok(0);
        }

        // Collect the atom and everything above it, then drop parents first.
        let mut doomed = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            doomed.push(current);
            if let Some(parents) = self.incoming.get(&current) {
                stack.extend(parents.iter().copied());
            }
        }

        for victim in doomed.iter().rev() {
            self.detach(*victim);
        }
        Ok(doomed.len())
    }

    fn detach(&mut self, id: AtomId) {
        let Some(atom) = self.atoms.remove(&id) else {
            return;
        };

        let key = if atom.is_node() {
            AtomKey::Node(atom.atom_type.clone(), atom.name.clone())
        } else {
            AtomKey::Link(atom.atom_type.clone(), atom.outgoing.clone())
        };
        self.index.remove(&key);

        if let Some(seq) = self.sequence.remove(&id) {
            if let Some(ids) = self.by_type.get_mut(&atom.atom_type) {
                ids.remove(&seq);
            }
        }

        for child in &atom.outgoing {
            if let Some(parents) = self.incoming.get_mut(child) {
                parents.remove(&id);
            }
        }
        self.incoming.remove(&id);
    }

    /// Get all atoms in the store.
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.values()
    }

    /// Get the total number of atoms.
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Parse Atomese text and add every top-level atom.
    pub fn load_str(&mut self, input: &str) -> Result<Vec<AtomId>, StoreError> {
        let exprs = parse_atomese(input)?;
        Ok(exprs.iter().map(|e| self.add(e)).collect())
    }

    /// Parse an Atomese file and add every top-level atom.
    ///
    /// Nothing is added when the file fails to parse.
    pub fn load_file(&mut self, path: &Path) -> Result<usize, StoreError> {
        let text = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let exprs = parse_atomese(&text).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        for expr in &exprs {
            self.add(expr);
        }
        Ok(exprs.len())
    }

    /// Serialise every top-level atom (atoms with no incoming set) as Atomese.
    pub fn dump(&self) -> String {
        let mut roots: Vec<_> = self
            .atoms
            .keys()
            .filter(|id| self.incoming.get(id).map_or(true, |s| s.is_empty()))
            .copied()
            .collect();
        roots.sort_by_key(|id| self.sequence.get(id).copied().unwrap_or(u64::MAX));

        roots
            .into_iter()
            .filter_map(|id| self.to_expr(id))
            .map(|e| e.to_atomese())
            .collect()
    }
}
