//! Truth-value statistics over derived subset links, and the pruning that
//! follows them.

use knowledge_store::{AtomId, AtomSpace, AtomType, StoreError, TruthValue};
use log::{debug, info, warn};
use thiserror::Error;

use crate::preprocess::PatientTotal;

/// Why one subset link could not be scored.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("subset link {0} does not have exactly two operands")]
    Shape(AtomId),

    #[error("cohort is empty")]
    EmptyCohort,

    #[error("pattern matched {count} individuals but the cohort has {total}")]
    ExceedsCohort { count: usize, total: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Counts from one run of [`calculate_truth_values`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TruthValueReport {
    /// Links whose operands received truth values.
    pub scored: usize,

    /// Links not of the patient-set / satisfying-set form.
    pub skipped: usize,

    /// Links that raised an error and were left as they were.
    pub failed: usize,
}

/// Whether an atom is an explicit patient set: a non-empty `SetLink` whose
/// members are all patient entities.
pub fn is_patient_set(store: &AtomSpace, id: AtomId) -> bool {
    let Some(atom) = store.get(id) else {
        return false;
    };
    atom.atom_type == AtomType::SetLink
        && !atom.outgoing.is_empty()
        && atom
            .outgoing
            .iter()
            .all(|m| store.get(*m).is_some_and(|a| a.is_patient()))
}

/// Score every subset link from an explicit patient set to a satisfying-set
/// scope.
///
/// The patient set gets strength `1 / total`; the scope gets the fraction of
/// the cohort its pattern retrieves. Both use the confidence of a sample of
/// `total`. A link that cannot be scored is logged and skipped.
pub fn calculate_truth_values(store: &mut AtomSpace, total: PatientTotal) -> TruthValueReport {
    info!("--- Calculating truth values over {} patients", total);

    let mut report = TruthValueReport::default();
    for link in store.atoms_by_type(&AtomType::SubsetLink) {
        match score_link(store, link, total.get()) {
            Ok(true) => report.scored += 1,
            Ok(false) => report.skipped += 1,
            Err(e) => {
                warn!("skipping subset link {}: {}", link, e);
                report.failed += 1;
            }
        }
    }

    info!(
        "scored {} subset links ({} not applicable, {} failed)",
        report.scored, report.skipped, report.failed
    );
    report
}

fn score_link(store: &mut AtomSpace, link: AtomId, total: usize) -> Result<bool, LinkError> {
    let atom = store.get(link).ok_or(StoreError::UnknownAtom(link))?;
    let [left, right] = atom.outgoing.as_slice() else {
        return Err(LinkError::Shape(link));
    };
    let (left, right) = (*left, *right);

    let is_scope = store
        .get(right)
        .is_some_and(|a| a.atom_type == AtomType::SatisfyingSetScopeLink);
    if !is_patient_set(store, left) || !is_scope {
        return Ok(false);
    }

    if total == 0 {
        return Err(LinkError::EmptyCohort);
    }

    let scope = store.to_expr(right).ok_or(StoreError::UnknownAtom(right))?;
    let count = store.execute_scope(&scope)?.len();
    if count > total {
        return Err(LinkError::ExceedsCohort { count, total });
    }

    let member = TruthValue::from_count(1.0 / total as f64, total);
    let fraction = TruthValue::from_count(count as f64 / total as f64, total);
    store.set_tv(left, member)?;
    store.set_tv(right, fraction)?;

    debug!("{} satisfies {}/{} of the cohort", right, count, total);
    Ok(true)
}

/// Remove every subset link whose left operand is not an explicit patient
/// set. Returns the number of links removed.
///
/// Removal is not recursive: a subset link nested inside another atom (the
/// profiled-gene pattern of a property conclusion, for instance) is part of
/// that atom and stays.
pub fn prune_subsets(store: &mut AtomSpace) -> Result<usize, StoreError> {
    let mut pruned = 0;

    for link in store.atoms_by_type(&AtomType::SubsetLink) {
        let Some(atom) = store.get(link) else {
            continue;
        };
        let keep = atom
            .outgoing
            .first()
            .is_some_and(|left| is_patient_set(store, *left));
        if !keep && store.remove(link, false)? > 0 {
            pruned += 1;
        }
    }

    info!("pruned {} subset links not describing a concrete cohort", pruned);
    Ok(pruned)
}

/// Remove top-level subset links whose own truth value has zero mean or zero
/// confidence. Returns the number of links removed.
pub fn prune_vacuous_subsets(store: &mut AtomSpace) -> Result<usize, StoreError> {
    let mut pruned = 0;

    for link in store.atoms_by_type(&AtomType::SubsetLink) {
        let vacuous = store
            .tv(link)
            .is_some_and(|tv| tv.mean() == 0.0 || tv.confidence == 0.0);
        if vacuous && store.remove(link, false)? > 0 {
            pruned += 1;
        }
    }

    info!("pruned {} vacuous subset links", pruned);
    Ok(pruned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledge_store::{count_to_confidence, Expr};

    fn expression(gene: &str, patient: &str) -> Expr {
        Expr::link(
            AtomType::EvaluationLink,
            vec![
                Expr::link(
                    AtomType::LazyExecutionOutputLink,
                    vec![
                        Expr::node(AtomType::SchemaNode, "make-overexpression-predicate"),
                        Expr::node(AtomType::GeneNode, gene),
                    ],
                ),
                Expr::concept(patient),
            ],
        )
    }

    fn overexpressing(gene: &str) -> Expr {
        Expr::link(
            AtomType::SatisfyingSetScopeLink,
            vec![
                Expr::var("$P"),
                Expr::link(
                    AtomType::EvaluationLink,
                    vec![
                        Expr::link(
                            AtomType::LazyExecutionOutputLink,
                            vec![
                                Expr::node(AtomType::SchemaNode, "make-overexpression-predicate"),
                                Expr::node(AtomType::GeneNode, gene),
                            ],
                        ),
                        Expr::var("$P"),
                    ],
                ),
            ],
        )
    }

    /// Eight patients, the first four over-expressing TP53.
    fn cohort() -> AtomSpace {
        let mut store = AtomSpace::new();
        for p in 1..=8 {
            let gene = if p <= 4 { "TP53" } else { "BRCA1" };
            store.add(&expression(gene, &p.to_string()));
        }
        store
    }

    #[test]
    fn test_half_the_cohort_gives_strength_one_half() {
        let mut store = cohort();
        let link = Expr::subset(Expr::set(vec![Expr::concept("1")]), overexpressing("TP53"));
        store.add(&link);

        let report = calculate_truth_values(&mut store, PatientTotal(8));
        assert_eq!(report.scored, 1);

        let scope = store.find(&overexpressing("TP53")).unwrap();
        let tv = store.tv(scope).unwrap();
        assert_eq!(tv.strength, 0.5);
        assert_eq!(tv.confidence, count_to_confidence(8));
        assert_eq!((tv.strength * 8.0).round() as usize, 4);

        let set = store.find(&Expr::set(vec![Expr::concept("1")])).unwrap();
        assert_eq!(store.tv(set).unwrap().strength, 1.0 / 8.0);
    }

    #[test]
    fn test_other_shapes_are_skipped() {
        let mut store = cohort();
        store.add(&Expr::subset(Expr::concept("x"), overexpressing("TP53")));
        store.add(&Expr::subset(
            Expr::set(vec![Expr::concept("1")]),
            Expr::concept("responders"),
        ));

        let report = calculate_truth_values(&mut store, PatientTotal(8));
        assert_eq!(report, TruthValueReport { scored: 0, skipped: 2, failed: 0 });
    }

    #[test]
    fn test_failures_do_not_stop_processing() {
        let mut store = cohort();
        store.add(&Expr::link(AtomType::SubsetLink, vec![Expr::concept("1")]));
        store.add(&Expr::subset(
            Expr::set(vec![Expr::concept("2")]),
            overexpressing("TP53"),
        ));

        // Only three patients claimed: four match, which is an error.
        let report = calculate_truth_values(&mut store, PatientTotal(3));
        assert_eq!(report.failed, 2);

        let report = calculate_truth_values(&mut store, PatientTotal(8));
        assert_eq!(report.failed, 1);
        assert_eq!(report.scored, 1);
    }

    #[test]
    fn test_empty_cohort_is_a_link_error() {
        let mut store = cohort();
        store.add(&Expr::subset(
            Expr::set(vec![Expr::concept("1")]),
            overexpressing("TP53"),
        ));
        let report = calculate_truth_values(&mut store, PatientTotal(0));
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn test_is_patient_set() {
        let mut store = cohort();
        let good = store.add(&Expr::set(vec![Expr::concept("1"), Expr::concept("2")]));
        let var = store.add(&Expr::set(vec![Expr::var("$p")]));
        let named = store.add(&Expr::set(vec![Expr::concept("responders")]));
        let empty = store.add(&Expr::set(Vec::new()));

        assert!(is_patient_set(&store, good));
        assert!(!is_patient_set(&store, var));
        assert!(!is_patient_set(&store, named));
        assert!(!is_patient_set(&store, empty));
    }

    #[test]
    fn test_prune_subsets_keeps_only_patient_sets() {
        let mut store = cohort();
        let keep = store.add(&Expr::subset(
            Expr::set(vec![Expr::concept("1")]),
            overexpressing("TP53"),
        ));
        store.add(&Expr::subset(
            Expr::set(vec![Expr::var("$p")]),
            overexpressing("TP53"),
        ));
        store.add(&Expr::subset(Expr::concept("x"), Expr::concept("y")));

        assert_eq!(prune_subsets(&mut store).unwrap(), 2);

        let remaining = store.atoms_by_type(&AtomType::SubsetLink);
        assert_eq!(remaining, vec![keep]);
        for link in remaining {
            let left = store.get(link).unwrap().outgoing[0];
            assert!(is_patient_set(&store, left));
        }
    }

    /// `(Subset (Set patient) (SatisfyingSet $pt (Subset (And $c profiled-genes) genes)))`
    fn property_conclusion(patient: &str) -> Expr {
        let genes = Expr::link(
            AtomType::SatisfyingSetScopeLink,
            vec![Expr::var("$G"), Expr::concept("expressed")],
        );
        let profiled = Expr::link(
            AtomType::AndLink,
            vec![Expr::var("$c"), Expr::concept("profiled-genes")],
        );
        Expr::subset(
            Expr::set(vec![Expr::concept(patient)]),
            Expr::link(
                AtomType::SatisfyingSetLink,
                vec![Expr::var("$pt"), Expr::subset(profiled, genes)],
            ),
        )
    }

    #[test]
    fn test_prune_keeps_property_conclusions() {
        let mut store = cohort();
        let conclusion = store.add(&property_conclusion("1"));
        store.add(&Expr::subset(
            Expr::set(vec![Expr::var("$p")]),
            overexpressing("TP53"),
        ));

        assert_eq!(prune_subsets(&mut store).unwrap(), 1);
        assert!(store.contains(conclusion));
        assert_eq!(store.find(&property_conclusion("1")), Some(conclusion));
        // The nested pattern link is still there, inside the conclusion.
        assert_eq!(store.atoms_by_type(&AtomType::SubsetLink).len(), 2);
    }

    #[test]
    fn test_prune_vacuous_subsets() {
        let mut store = cohort();
        store.add(
            &Expr::subset(Expr::set(vec![Expr::concept("1")]), Expr::concept("a"))
                .with_tv(TruthValue::new(0.0, 0.9)),
        );
        store.add(
            &Expr::subset(Expr::set(vec![Expr::concept("2")]), Expr::concept("a"))
                .with_tv(TruthValue::new(0.6, 0.9)),
        );
        store.add(&Expr::subset(
            Expr::set(vec![Expr::concept("3")]),
            Expr::concept("a"),
        ));

        assert_eq!(prune_vacuous_subsets(&mut store).unwrap(), 2);
        assert_eq!(store.atoms_by_type(&AtomType::SubsetLink).len(), 1);
    }
}
