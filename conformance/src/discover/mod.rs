use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::errors::SetupError;

/// Test inputs directly inside `dir` with the given extension, sorted.
///
/// Subdirectories are not entered, so the invalid programs under
/// `<root>/fail` stay out of the valid suite. A missing directory has no
/// inputs.
pub fn discover_inputs(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, SetupError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut inputs = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| SetupError::Discovery {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            inputs.push(path.to_path_buf());
        }
    }
    inputs.sort();

    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "").unwrap();
    }

    #[test]
    fn finds_matching_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("while.c"));
        touch(&dir.path().join("block.c"));
        touch(&dir.path().join("block.c.out"));
        touch(&dir.path().join("notes.txt"));

        let found = discover_inputs(dir.path(), "c").unwrap();
        assert_eq!(
            found,
            vec![dir.path().join("block.c"), dir.path().join("while.c")]
        );
    }

    #[test]
    fn does_not_descend_into_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("ok.c"));
        touch(&dir.path().join("fail").join("bad.c"));

        let found = discover_inputs(dir.path(), "c").unwrap();
        assert_eq!(found, vec![dir.path().join("ok.c")]);

        let failing = discover_inputs(&dir.path().join("fail"), "c").unwrap();
        assert_eq!(failing, vec![dir.path().join("fail").join("bad.c")]);
    }

    #[test]
    fn missing_or_empty_directory_has_no_inputs() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_inputs(dir.path(), "c").unwrap().is_empty());
        assert!(discover_inputs(&dir.path().join("absent"), "c")
            .unwrap()
            .is_empty());
    }
}
