//! Preprocessing - drops vacuous evidence and patients without expression data.
//!
//! Both passes must finish before the cohort size is known. The size is only
//! obtainable as a [`PatientTotal`] returned by [`filter_patients`], so no
//! later stage can use a denominator computed before filtering.

use knowledge_store::{AtomId, AtomSpace, AtomType, StoreError};
use log::{debug, info};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::PipelineError;

/// Number of patients retained after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatientTotal(pub(crate) usize);

impl PatientTotal {
    pub fn get(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for PatientTotal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of the patient filter.
#[derive(Debug, Clone)]
pub struct PatientFilter {
    pub total: PatientTotal,

    /// Identifiers of the removed patients, in numeric order.
    pub removed: Vec<String>,
}

/// Remove every evaluation fact whose truth value has a mean of exactly zero.
///
/// Links built on top of a vacuous fact go with it. Returns the number of
/// facts removed.
pub fn remove_vacuous_evaluations(store: &mut AtomSpace) -> Result<usize, StoreError> {
    let mut removed = 0;

    for id in store.atoms_by_type(&AtomType::EvaluationLink) {
        let vacuous = store.tv(id).is_some_and(|tv| tv.mean() == 0.0);
        if vacuous {
            store.remove(id, true)?;
            removed += 1;
        }
    }

    debug!("removed {} vacuous evaluation facts", removed);
    Ok(removed)
}

/// Patients with at least one gene-expression fact.
///
/// A gene-expression fact is an evaluation whose first argument is a lazily
/// applied predicate; the patient is its second argument.
pub fn patients_with_expression(store: &AtomSpace) -> HashSet<AtomId> {
    store
        .atoms_by_type(&AtomType::EvaluationLink)
        .into_iter()
        .filter_map(|id| {
            let fact = store.get(id)?;
            let [predicate, subject] = fact.outgoing.as_slice() else {
                return None;
            };
            let is_expression =
                store.get(*predicate)?.atom_type == AtomType::LazyExecutionOutputLink;
            (is_expression && store.get(*subject)?.is_patient()).then_some(*subject)
        })
        .collect()
}

/// Delete every patient without gene-expression evidence, together with all
/// facts that reference it, and record the removed identifiers in
/// `audit_path`, one per line.
pub fn filter_patients(
    store: &mut AtomSpace,
    audit_path: &Path,
) -> Result<PatientFilter, PipelineError> {
    let evidence = patients_with_expression(store);

    let mut removed = Vec::new();
    for id in store.atoms_by_type(&AtomType::ConceptNode) {
        let Some(atom) = store.get(id) else {
            continue;
        };
        if atom.is_patient() && !evidence.contains(&id) {
            removed.push(atom.name.clone());
            store.remove(id, true)?;
        }
    }
    // Numeric order for plain identifiers.
    removed.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

    write_audit(audit_path, &removed)?;

    let total = PatientTotal(evidence.len());
    info!(
        "retained {} patients, filtered out {} without gene expression",
        total,
        removed.len()
    );
    Ok(PatientFilter { total, removed })
}

fn write_audit(path: &Path, removed: &[String]) -> Result<(), PipelineError> {
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for name in removed {
        writeln!(writer, "{}", name).map_err(|e| PipelineError::io(path, e))?;
    }
    writer.flush().map_err(|e| PipelineError::io(path, e))
}
