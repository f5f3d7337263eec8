//! Atomese reader.
//!
//! Reads the parenthesised notation the cohort data files are written in:
//!
//! ```text
//! ; comments start with a semicolon
//! (ConceptNode "615289")
//! (Evaluation (stv 0.8 0.9)
//!   (LazyExecutionOutput (Schema "make-overexpression-predicate") (Gene "TP53"))
//!   (Concept "615289"))
//! ```
//!
//! A form whose first argument is a string is a node, otherwise a link.
//! `(stv s c)` or `(cog-new-stv s c)` among the arguments sets the truth value.

use crate::atom::{AtomType, Expr, TruthValue};
use crate::error::ParseError;

/// Parse a document into its top-level atom expressions.
pub fn parse_atomese(input: &str) -> Result<Vec<Expr>, ParseError> {
    let mut reader = Reader { input, pos: 0 };
    let mut exprs = Vec::new();

    loop {
        reader.skip_trivia();
        if reader.at_end() {
            break;
        }
        let sexpr = reader.read()?;
        exprs.push(to_expr(&sexpr)?);
    }

    Ok(exprs)
}

/// Raw S-expression with the byte offset it started at.
#[derive(Debug, Clone)]
enum SExpr {
    List(Vec<SExpr>, usize),
    Str(String, usize),
    Symbol(String, usize),
}

impl SExpr {
    fn position(&self) -> usize {
        match self {
            SExpr::List(_, p) | SExpr::Str(_, p) | SExpr::Symbol(_, p) => *p,
        }
    }
}

struct Reader<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();

            if trimmed.starts_with(';') {
                match trimmed.find('\n') {
                    Some(nl) => self.pos += nl + 1,
                    None => self.pos = self.input.len(),
                }
            } else {
                break;
            }
        }
    }

    fn read(&mut self) -> Result<SExpr, ParseError> {
        self.skip_trivia();
        let start = self.pos;
        let rest = self.rest();

        if rest.starts_with('(') {
            self.pos += 1;
            let mut items = Vec::new();
            loop {
                self.skip_trivia();
                if self.at_end() {
                    return Err(ParseError::UnexpectedEof(start));
                }
                if self.rest().starts_with(')') {
                    self.pos += 1;
                    return Ok(SExpr::List(items, start));
                }
                items.push(self.read()?);
            }
        } else if rest.starts_with(')') {
            Err(ParseError::Syntax {
                position: start,
                message: "unbalanced ')'".to_string(),
            })
        } else if rest.starts_with('"') {
            let mut value = String::new();
            let mut escaped = false;
            for (i, c) in rest[1..].char_indices() {
                if escaped {
                    value.push(c);
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    self.pos += i + 2;
                    return Ok(SExpr::Str(value, start));
                } else {
                    value.push(c);
                }
            }
            Err(ParseError::UnterminatedString(start))
        } else {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '(' || c == ')' || c == ';' || c == '"')
                .unwrap_or(rest.len());
            self.pos += end;
            Ok(SExpr::Symbol(rest[..end].to_string(), start))
        }
    }
}

fn is_tv_form(items: &[SExpr]) -> bool {
    matches!(items.first(), Some(SExpr::Symbol(s, _)) if s == "stv" || s == "cog-new-stv")
}

fn to_tv(items: &[SExpr], position: usize) -> Result<TruthValue, ParseError> {
    let number = |item: Option<&SExpr>| -> Result<f64, ParseError> {
        match item {
            Some(SExpr::Symbol(s, _)) => s.parse().map_err(|_| ParseError::TruthValue(position)),
            _ => Err(ParseError::TruthValue(position)),
        }
    };

    if items.len() != 3 {
        return Err(ParseError::TruthValue(position));
    }
    let strength = number(items.get(1))?;
    let confidence = number(items.get(2))?;
    Ok(TruthValue::new(strength, confidence))
}

fn to_expr(sexpr: &SExpr) -> Result<Expr, ParseError> {
    let (items, position) = match sexpr {
        SExpr::List(items, p) => (items, *p),
        other => {
            return Err(ParseError::Syntax {
                position: other.position(),
                message: "expected an atom form".to_string(),
            })
        }
    };

    let type_name = match items.first() {
        Some(SExpr::Symbol(s, _)) if s.starts_with(|c: char| c.is_ascii_uppercase()) => s,
        Some(SExpr::Symbol(s, _)) => {
            return Err(ParseError::Syntax {
                position,
                message: format!("`{}` is not an atom type", s),
            })
        }
        _ => {
            return Err(ParseError::Syntax {
                position,
                message: "form does not start with an atom type".to_string(),
            })
        }
    };

    let mut tv = None;
    let mut name = None;
    let mut outgoing = Vec::new();

    for arg in &items[1..] {
        match arg {
            SExpr::List(inner, p) if is_tv_form(inner) => tv = Some(to_tv(inner, *p)?),
            SExpr::List(..) => outgoing.push(to_expr(arg)?),
            SExpr::Str(s, p) => {
                if name.is_some() || !outgoing.is_empty() {
                    return Err(ParseError::Syntax {
                        position: *p,
                        message: "unexpected string argument".to_string(),
                    });
                }
                name = Some(s.clone());
            }
            SExpr::Symbol(s, p) => {
                return Err(ParseError::Syntax {
                    position: *p,
                    message: format!("unexpected symbol `{}`", s),
                })
            }
        }
    }

    let expr = match name {
        Some(name) if outgoing.is_empty() => {
            Expr::node(AtomType::from_name(type_name, true), name)
        }
        Some(_) => {
            return Err(ParseError::Syntax {
                position,
                message: "node forms cannot have outgoing atoms".to_string(),
            })
        }
        None => {
            let atom_type = AtomType::from_name(type_name, false);
            let known_node = !matches!(
                AtomType::from_name(type_name, true),
                AtomType::OtherNode(_)
            );
            if atom_type.is_node() || (known_node && !type_name.ends_with("Link")) {
                return Err(ParseError::Syntax {
                    position,
                    message: format!("{} requires a name", AtomType::from_name(type_name, true)),
                });
            }
            Expr::link(atom_type, outgoing)
        }
    };

    Ok(match tv {
        Some(tv) => expr.with_tv(tv),
        None => expr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nodes_and_links() {
        let input = r#"
            ; patient with one measurement
            (ConceptNode "615289")
            (Evaluation (stv 0.8 0.9)
              (LazyExecutionOutput (Schema "make-overexpression-predicate") (Gene "TP53"))
              (Concept "615289"))
        "#;

        let exprs = parse_atomese(input).unwrap();
        assert_eq!(exprs.len(), 2);
        assert_eq!(exprs[0], Expr::concept("615289"));

        let eval = &exprs[1];
        assert_eq!(eval.atom_type(), &AtomType::EvaluationLink);
        assert_eq!(eval.tv(), Some(TruthValue::new(0.8, 0.9)));
        assert_eq!(eval.outgoing().len(), 2);
        assert_eq!(
            eval.outgoing()[0].atom_type(),
            &AtomType::LazyExecutionOutputLink
        );
        assert_eq!(eval.outgoing()[0].outgoing()[1].atom_type(), &AtomType::GeneNode);
    }

    #[test]
    fn test_node_truth_value_after_name() {
        let exprs = parse_atomese(r#"(Concept "a" (cog-new-stv 0 0.5))"#).unwrap();
        assert_eq!(exprs[0].tv(), Some(TruthValue::new(0.0, 0.5)));
        assert_eq!(exprs[0].name(), Some("a"));
    }

    #[test]
    fn test_reads_back_exported_text() {
        let original = Expr::subset(
            Expr::set(vec![Expr::concept("1"), Expr::concept("2")]),
            Expr::concept("responder"),
        )
        .with_tv(TruthValue::new(0.25, 0.5));

        let parsed = parse_atomese(&original.to_atomese()).unwrap();
        assert_eq!(parsed, vec![original]);
    }

    #[test]
    fn test_escaped_string() {
        let exprs = parse_atomese(r#"(Concept "a \"quoted\" name")"#).unwrap();
        assert_eq!(exprs[0].name(), Some("a \"quoted\" name"));
    }

    #[test]
    fn test_unbalanced_input_is_rejected() {
        assert!(matches!(
            parse_atomese("(Concept \"a\""),
            Err(ParseError::UnexpectedEof(0))
        ));
        assert!(matches!(
            parse_atomese("(Concept \"a)"),
            Err(ParseError::UnterminatedString(9))
        ));
        assert!(parse_atomese(")").is_err());
    }

    #[test]
    fn test_non_atom_forms_are_rejected() {
        assert!(parse_atomese("(define x 1)").is_err());
        assert!(parse_atomese("(Concept \"a\" (Concept \"b\"))").is_err());
        assert!(parse_atomese("(Concept)").is_err());
        assert!(parse_atomese("(Evaluation (stv 1))").is_err());
    }
}
