//! Drives an external reasoning engine as a child process.
//!
//! The request is written to the engine's stdin as one JSON document; the
//! engine answers on stdout with the atoms it derived, in Atomese.

use knowledge_store::{parse_atomese, AtomSpace};
use log::{debug, info};
use serde::Serialize;
use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

use super::{ChainerOutcome, ChainerQuery, Reasoner, ReasonerError};

/// Wire form of a [`ChainerQuery`].
#[derive(Debug, Serialize)]
pub struct ChainerRequest<'a> {
    pub rule_files: Vec<String>,
    pub rules: &'a [String],
    pub target: String,
    pub vardecl: Option<String>,
    pub maximum_iterations: u32,
    pub complexity_penalty: f64,

    /// Snapshot of the store the engine reasons over.
    pub atomspace: String,
}

impl<'a> ChainerRequest<'a> {
    pub fn new(query: &'a ChainerQuery, store: &AtomSpace) -> Self {
        Self {
            rule_files: query
                .rule_set
                .rule_files()
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            rules: query.rule_set.rules(),
            target: query.target.to_atomese(),
            vardecl: query.vardecl_expr().map(|e| e.to_atomese()),
            maximum_iterations: query.max_iterations,
            complexity_penalty: query.complexity_penalty,
            atomspace: store.dump(),
        }
    }
}

/// Reasoner backed by an external program.
#[derive(Debug, Clone)]
pub struct CommandReasoner {
    program: String,
    args: Vec<String>,
}

impl CommandReasoner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a `[program, args...]` list; `None` when the list is empty.
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }
}

impl Reasoner for CommandReasoner {
    fn name(&self) -> &str {
        &self.program
    }

    fn backward_chain(
        &mut self,
        store: &mut AtomSpace,
        query: &ChainerQuery,
    ) -> Result<ChainerOutcome, ReasonerError> {
        let request = serde_json::to_vec(&ChainerRequest::new(query, store))?;
        info!(
            "chaining {} with rules {:?} (max {} iterations)",
            query.target,
            query.rule_set.rules(),
            query.max_iterations
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ReasonerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            ReasonerError::Io(std::io::Error::other("engine stdin unavailable"))
        })?;

        // Feed the request while draining output so neither side blocks.
        let (output, written) = thread::scope(|scope| {
            let writer = scope.spawn(move || {
                let result = stdin.write_all(&request);
                drop(stdin);
                result
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("request writer panicked")));
            (output, written)
        });

        let output = output?;
        if !output.status.success() {
            return Err(ReasonerError::Exit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        written?;

        let text = String::from_utf8_lossy(&output.stdout);
        let derived: Vec<_> = parse_atomese(&text)?
            .iter()
            .map(|expr| store.add(expr))
            .collect();

        debug!("{} returned {} atoms", self.program, derived.len());
        Ok(ChainerOutcome { derived })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoner::RuleSet;
    use knowledge_store::{AtomType, Expr};

    fn query() -> ChainerQuery {
        ChainerQuery {
            rule_set: RuleSet::empty()
                .load_from_path("rules/patients_subset_rule.scm")
                .with_rule("gene-expression-subset-rule"),
            target: Expr::subset(Expr::set(vec![Expr::var("$p")]), Expr::var("$ppty")),
            vardecl: Vec::new(),
            max_iterations: 2,
            complexity_penalty: 10.0,
        }
    }

    #[test]
    fn test_from_command() {
        assert!(CommandReasoner::from_command(&[]).is_none());
        let r = CommandReasoner::from_command(&["engine".to_string(), "-q".to_string()]).unwrap();
        assert_eq!(r.name(), "engine");
        assert_eq!(r.args, vec!["-q"]);
    }

    #[test]
    fn test_request_encoding() {
        let mut store = AtomSpace::new();
        store.add(&Expr::concept("1"));
        let q = query();

        let json = serde_json::to_value(ChainerRequest::new(&q, &store)).unwrap();
        assert_eq!(json["rules"][0], "gene-expression-subset-rule");
        assert_eq!(json["rule_files"][0], "rules/patients_subset_rule.scm");
        assert_eq!(json["maximum_iterations"], 2);
        assert_eq!(json["complexity_penalty"], 10.0);
        assert!(json["vardecl"].is_null());
        assert!(json["target"].as_str().unwrap().starts_with("(SubsetLink"));
        assert_eq!(json["atomspace"], "(ConceptNode \"1\")\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_derived_atoms_are_added() {
        let mut store = AtomSpace::new();
        let mut reasoner = CommandReasoner::new(
            "sh",
            vec![
                "-c".to_string(),
                "cat > /dev/null; echo '(Subset (Set (Concept \"1\")) (Concept \"x\"))'"
                    .to_string(),
            ],
        );

        let outcome = reasoner.backward_chain(&mut store, &query()).unwrap();
        assert_eq!(outcome.derived.len(), 1);
        assert_eq!(store.atoms_by_type(&AtomType::SubsetLink).len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_engine_failure_is_reported() {
        let mut store = AtomSpace::new();
        let mut reasoner = CommandReasoner::new(
            "sh",
            vec!["-c".to_string(), "cat > /dev/null; echo boom >&2; exit 3".to_string()],
        );

        match reasoner.backward_chain(&mut store, &query()) {
            Err(ReasonerError::Exit { stderr, .. }) => assert_eq!(stderr, "boom"),
            other => panic!("expected exit error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_program_is_reported() {
        let mut store = AtomSpace::new();
        let mut reasoner = CommandReasoner::new("definitely-not-a-reasoner-binary", Vec::new());
        assert!(matches!(
            reasoner.backward_chain(&mut store, &query()),
            Err(ReasonerError::Spawn { .. })
        ));
    }
}
