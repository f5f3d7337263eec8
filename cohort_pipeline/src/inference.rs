//! Inference drivers - the chaining calls that derive subset and attraction links.
//!
//! Every call starts from an empty rule set and activates only the rules it
//! names. Pattern A is run once per subset rule rather than once with all of
//! them, so each rule's conclusions are derived in isolation.

use knowledge_store::{AtomSpace, AtomType, Expr, VariableDecl};
use log::info;
use std::path::Path;

use crate::reasoner::{ChainerQuery, Reasoner, ReasonerError, RuleSet};

/// Iteration bound of every chaining call.
pub const MAX_ITERATIONS: u32 = 2;

/// Complexity penalty of every chaining call.
pub const COMPLEXITY_PENALTY: f64 = 10.0;

pub const PATIENT_SUBSET_RULE_FILE: &str = "patients_subset_rule.scm";
pub const PROPERTY_SUBSET_RULE_FILE: &str = "patients-ppty-rule.scm";
pub const NEGATION_RULE_FILE: &str = "subset_negation_rule.scm";
pub const ATTRACTION_RULE_FILE: &str = "subset_attraction_rule.scm";

/// Rules run one at a time against pattern A, in this order.
pub const PATIENT_SUBSET_RULES: [&str; 3] = [
    "gene-expression-subset-rule",
    "patient-data-boolean-subset-rule",
    "patient-data-subset-rule",
];

pub const PROPERTY_SUBSET_RULE: &str = "patient-ppty-subset-rule";
pub const NEGATION_RULE: &str = "subset-negation-patients-rule";
pub const ATTRACTION_RULE: &str = "subset-attraction-patients-rule";

/// Pattern A: `(Subset (Set $p) $ppty)`.
pub fn patient_subset_target() -> Expr {
    Expr::subset(Expr::set(vec![Expr::var("$p")]), Expr::var("$ppty"))
}

/// Pattern A restricts `$p` to concepts and `$ppty` to satisfying-set scopes.
pub fn patient_subset_vardecl() -> Vec<VariableDecl> {
    vec![
        VariableDecl::typed("$p", AtomType::ConceptNode),
        VariableDecl::typed("$ppty", AtomType::SatisfyingSetScopeLink),
    ]
}

/// Pattern B: a patient set inside the satisfying set of a profiled-gene property.
pub fn property_subset_target() -> Expr {
    let expressed = Expr::link(
        AtomType::EvaluationLink,
        vec![
            Expr::link(
                AtomType::LazyExecutionOutputLink,
                vec![Expr::var("$S"), Expr::var("$G")],
            ),
            Expr::var("$pt"),
        ],
    );
    let genes = Expr::link(
        AtomType::SatisfyingSetScopeLink,
        vec![Expr::var("$G"), expressed],
    );
    let profiled = Expr::link(
        AtomType::AndLink,
        vec![Expr::var("$c"), Expr::concept("profiled-genes")],
    );

    Expr::subset(
        Expr::set(vec![Expr::var("$p")]),
        Expr::link(
            AtomType::SatisfyingSetLink,
            vec![Expr::var("$pt"), Expr::subset(profiled, genes)],
        ),
    )
}

/// `(Subset (Not (Set $X)) $Y)`
pub fn negation_target() -> Expr {
    Expr::subset(
        Expr::link(AtomType::NotLink, vec![Expr::set(vec![Expr::var("$X")])]),
        Expr::var("$Y"),
    )
}

/// `(Attraction (Set $X) $Y)`
pub fn attraction_target() -> Expr {
    Expr::link(
        AtomType::AttractionLink,
        vec![Expr::set(vec![Expr::var("$X")]), Expr::var("$Y")],
    )
}

fn query(rule_set: RuleSet, target: Expr, vardecl: Vec<VariableDecl>) -> ChainerQuery {
    ChainerQuery {
        rule_set,
        target,
        vardecl,
        max_iterations: MAX_ITERATIONS,
        complexity_penalty: COMPLEXITY_PENALTY,
    }
}

/// Queries for pattern A, one per subset rule.
pub fn patient_subset_queries(rules_dir: &Path) -> Vec<ChainerQuery> {
    PATIENT_SUBSET_RULES
        .iter()
        .map(|rule| {
            let rules = RuleSet::empty()
                .load_from_path(rules_dir.join(PATIENT_SUBSET_RULE_FILE))
                .with_rule(*rule);
            query(rules, patient_subset_target(), patient_subset_vardecl())
        })
        .collect()
}

/// Query for pattern B.
pub fn property_subset_query(rules_dir: &Path) -> ChainerQuery {
    let rules = RuleSet::empty()
        .load_from_path(rules_dir.join(PROPERTY_SUBSET_RULE_FILE))
        .with_rule(PROPERTY_SUBSET_RULE);
    query(rules, property_subset_target(), Vec::new())
}

/// Queries for the negation and attraction targets, sharing one rule set.
pub fn attraction_queries(rules_dir: &Path) -> Vec<ChainerQuery> {
    let rules = RuleSet::empty()
        .load_from_path(rules_dir.join(NEGATION_RULE_FILE))
        .load_from_path(rules_dir.join(ATTRACTION_RULE_FILE))
        .with_rule(NEGATION_RULE)
        .with_rule(ATTRACTION_RULE);

    vec![
        query(rules.clone(), negation_target(), Vec::new()),
        query(rules, attraction_target(), Vec::new()),
    ]
}

fn run_all(
    reasoner: &mut dyn Reasoner,
    store: &mut AtomSpace,
    queries: &[ChainerQuery],
) -> Result<usize, ReasonerError> {
    let mut derived = 0;
    for q in queries {
        derived += reasoner.backward_chain(store, q)?.derived.len();
    }
    Ok(derived)
}

/// Derive subset links for pattern A, one isolated rule at a time.
pub fn infer_patient_subsets(
    reasoner: &mut dyn Reasoner,
    store: &mut AtomSpace,
    rules_dir: &Path,
) -> Result<usize, ReasonerError> {
    info!("--- Inferring patient subsets with {}", reasoner.name());
    let derived = run_all(reasoner, store, &patient_subset_queries(rules_dir))?;
    info!("pattern A derived {} atoms", derived);
    Ok(derived)
}

/// Derive subset links for pattern B.
pub fn infer_property_subsets(
    reasoner: &mut dyn Reasoner,
    store: &mut AtomSpace,
    rules_dir: &Path,
) -> Result<usize, ReasonerError> {
    info!("--- Inferring profiled-gene property subsets");
    let derived = run_all(reasoner, store, &[property_subset_query(rules_dir)])?;
    info!("pattern B derived {} atoms", derived);
    Ok(derived)
}

/// Derive negated subsets and attraction links.
pub fn derive_attraction(
    reasoner: &mut dyn Reasoner,
    store: &mut AtomSpace,
    rules_dir: &Path,
) -> Result<usize, ReasonerError> {
    info!("--- Deriving attraction links");
    let derived = run_all(reasoner, store, &attraction_queries(rules_dir))?;
    info!("attraction stage derived {} atoms", derived);
    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoner::ChainerOutcome;

    /// Records every query it receives.
    #[derive(Default)]
    struct Recorder {
        queries: Vec<ChainerQuery>,
    }

    impl Reasoner for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn backward_chain(
            &mut self,
            _store: &mut AtomSpace,
            query: &ChainerQuery,
        ) -> Result<ChainerOutcome, ReasonerError> {
            self.queries.push(query.clone());
            Ok(ChainerOutcome::default())
        }
    }

    #[test]
    fn test_pattern_a_runs_each_rule_in_isolation() {
        let mut recorder = Recorder::default();
        let mut store = AtomSpace::new();
        infer_patient_subsets(&mut recorder, &mut store, Path::new("rules")).unwrap();

        assert_eq!(recorder.queries.len(), 3);
        for (q, rule) in recorder.queries.iter().zip(PATIENT_SUBSET_RULES) {
            assert_eq!(q.rule_set.rules(), [rule]);
            assert_eq!(
                q.rule_set.rule_files(),
                [Path::new("rules").join(PATIENT_SUBSET_RULE_FILE)]
            );
            assert_eq!(q.target, patient_subset_target());
            assert_eq!(q.vardecl, patient_subset_vardecl());
            assert_eq!(q.max_iterations, MAX_ITERATIONS);
            assert_eq!(q.complexity_penalty, COMPLEXITY_PENALTY);
        }
    }

    #[test]
    fn test_pattern_b_uses_dedicated_rule() {
        let mut recorder = Recorder::default();
        let mut store = AtomSpace::new();
        infer_property_subsets(&mut recorder, &mut store, Path::new("rules")).unwrap();

        assert_eq!(recorder.queries.len(), 1);
        let q = &recorder.queries[0];
        assert_eq!(q.rule_set.rules(), [PROPERTY_SUBSET_RULE]);
        assert!(q.vardecl.is_empty());
        assert!(q.target.to_string().contains("(ConceptNode \"profiled-genes\")"));
    }

    #[test]
    fn test_attraction_stage_targets() {
        let mut recorder = Recorder::default();
        let mut store = AtomSpace::new();
        derive_attraction(&mut recorder, &mut store, Path::new("rules")).unwrap();

        assert_eq!(recorder.queries.len(), 2);
        assert_eq!(recorder.queries[0].target, negation_target());
        assert_eq!(recorder.queries[1].target, attraction_target());
        for q in &recorder.queries {
            assert_eq!(q.rule_set.rules(), [NEGATION_RULE, ATTRACTION_RULE]);
            assert_eq!(q.rule_set.rule_files().len(), 2);
        }
    }

    #[test]
    fn test_target_shapes() {
        assert_eq!(
            negation_target().to_string(),
            "(SubsetLink (NotLink (SetLink (VariableNode \"$X\"))) (VariableNode \"$Y\"))"
        );
        let vars = property_subset_target().variables();
        for v in ["$p", "$pt", "$c", "$G", "$S"] {
            assert!(vars.contains(v));
        }
    }
}
