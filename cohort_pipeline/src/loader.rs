//! Populates the store from a directory of knowledge-base files.

use knowledge_store::AtomSpace;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::DATA_EXTENSION;
use crate::error::PipelineError;

/// Knowledge-base files in `dir`, in directory-listing order.
pub fn data_files(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    if !dir.is_dir() {
        return Err(PipelineError::MissingDataDir(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))? {
        let path = entry.map_err(|e| PipelineError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == DATA_EXTENSION) {
            files.push(path);
        }
    }
    Ok(files)
}

/// Load every knowledge-base file in `dir` into the store.
///
/// A file that cannot be read or parsed aborts the load. Returns the number
/// of top-level atoms read.
pub fn populate(store: &mut AtomSpace, dir: &Path) -> Result<usize, PipelineError> {
    info!("--- Populating the store from {}", dir.display());

    let mut total = 0;
    for path in data_files(dir)? {
        let count = store.load_file(&path)?;
        debug!("loaded {} atoms from {}", count, path.display());
        total += count;
    }

    info!("loaded {} atoms ({} in store)", total, store.len());
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledge_store::AtomType;

    #[test]
    fn test_populate_reads_only_data_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.scm"), "(Concept \"1\")\n(Concept \"2\")").unwrap();
        fs::write(dir.path().join("b.scm"), "(Concept \"3\")").unwrap();
        fs::write(dir.path().join("notes.txt"), "(Concept \"4\")").unwrap();

        let mut store = AtomSpace::new();
        assert_eq!(populate(&mut store, dir.path()).unwrap(), 3);
        assert_eq!(store.atoms_by_type(&AtomType::ConceptNode).len(), 3);
        assert!(store.find_node(&AtomType::ConceptNode, "4").is_none());
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AtomSpace::new();
        let err = populate(&mut store, &dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, PipelineError::MissingDataDir(_)));
    }

    #[test]
    fn test_malformed_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.scm"), "(Concept \"1\"").unwrap();

        let mut store = AtomSpace::new();
        assert!(matches!(
            populate(&mut store, dir.path()),
            Err(PipelineError::Store(_))
        ));
    }
}
