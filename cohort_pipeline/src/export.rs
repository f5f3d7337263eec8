//! Writes selected link types to flat Atomese files for embedding generation.

use knowledge_store::{AtomId, AtomSpace, AtomType};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::{ATTRACTION_LINKS_FILE, SUBSET_LINKS_FILE};
use crate::error::PipelineError;

/// Number of links written per file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub subset_links: usize,
    pub attraction_links: usize,
}

/// Write every link of `atom_type` to `path`, one serialised atom per entry.
///
/// A link nested inside another link of the same type is written as part of
/// that link only.
pub fn export_links(
    store: &AtomSpace,
    atom_type: &AtomType,
    path: &Path,
) -> Result<usize, PipelineError> {
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    let mut written = 0;
    for id in store.atoms_by_type(atom_type) {
        if nested_in_same_type(store, id, atom_type) {
            continue;
        }
        if let Some(expr) = store.to_expr(id) {
            writer
                .write_all(expr.to_atomese().as_bytes())
                .map_err(|e| PipelineError::io(path, e))?;
            written += 1;
        }
    }
    writer.flush().map_err(|e| PipelineError::io(path, e))?;

    info!("wrote {} {} to {}", written, atom_type, path.display());
    Ok(written)
}

fn nested_in_same_type(store: &AtomSpace, id: AtomId, atom_type: &AtomType) -> bool {
    store
        .incoming(id)
        .into_iter()
        .any(|parent| store.get(parent).is_some_and(|p| p.atom_type == *atom_type))
}

/// Export subset and attraction links into `output_dir`.
pub fn export_all(store: &AtomSpace, output_dir: &Path) -> Result<ExportSummary, PipelineError> {
    info!("--- Exporting links to {}", output_dir.display());
    Ok(ExportSummary {
        subset_links: export_links(
            store,
            &AtomType::SubsetLink,
            &output_dir.join(SUBSET_LINKS_FILE),
        )?,
        attraction_links: export_links(
            store,
            &AtomType::AttractionLink,
            &output_dir.join(ATTRACTION_LINKS_FILE),
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledge_store::{parse_atomese, Expr, TruthValue};
    use std::collections::HashSet;
    use std::fs;

    fn store() -> AtomSpace {
        let mut store = AtomSpace::new();
        store.add(
            &Expr::subset(Expr::set(vec![Expr::concept("1")]), Expr::concept("a"))
                .with_tv(TruthValue::new(0.5, 0.2)),
        );
        store.add(&Expr::subset(
            Expr::set(vec![Expr::concept("2")]),
            Expr::concept("a"),
        ));
        store.add(&Expr::link(
            AtomType::AttractionLink,
            vec![Expr::set(vec![Expr::concept("1")]), Expr::concept("a")],
        ));
        store
    }

    fn entries(path: &Path) -> HashSet<String> {
        let text = fs::read_to_string(path).unwrap();
        parse_atomese(&text)
            .unwrap()
            .iter()
            .map(|e| e.to_atomese())
            .collect()
    }

    #[test]
    fn test_export_all_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let summary = export_all(&store(), dir.path()).unwrap();

        assert_eq!(summary, ExportSummary { subset_links: 2, attraction_links: 1 });

        let subsets = entries(&dir.path().join(SUBSET_LINKS_FILE));
        assert_eq!(subsets.len(), 2);
        assert!(subsets.iter().any(|s| s.contains("(stv 0.5 0.2)")));

        let attraction = fs::read_to_string(dir.path().join(ATTRACTION_LINKS_FILE)).unwrap();
        assert!(attraction.starts_with("(AttractionLink\n"));
    }

    #[test]
    fn test_export_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let path = dir.path().join("subset.scm");

        export_links(&store, &AtomType::SubsetLink, &path).unwrap();
        let first = entries(&path);
        export_links(&store, &AtomType::SubsetLink, &path).unwrap();
        assert_eq!(entries(&path), first);
    }

    #[test]
    fn test_nested_subset_is_written_inside_its_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subset.scm");
        let inner = Expr::subset(
            Expr::link(
                AtomType::AndLink,
                vec![Expr::var("$c"), Expr::concept("profiled-genes")],
            ),
            Expr::concept("genes"),
        );
        let outer = Expr::subset(
            Expr::set(vec![Expr::concept("1")]),
            Expr::link(
                AtomType::SatisfyingSetLink,
                vec![Expr::var("$pt"), inner],
            ),
        );
        let mut store = AtomSpace::new();
        store.add(&outer);

        assert_eq!(export_links(&store, &AtomType::SubsetLink, &path).unwrap(), 1);
        let written = parse_atomese(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, vec![outer]);
    }

    #[test]
    fn test_unwritable_destination_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir").join("out.scm");
        assert!(matches!(
            export_links(&store(), &AtomType::SubsetLink, &missing),
            Err(PipelineError::Io { .. })
        ));
    }
}
