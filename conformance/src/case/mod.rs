use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::errors::SetupError;

/// A single test input and the files derived from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub input: PathBuf,
    /// Final path segment of `input`, e.g. `block.c`.
    pub name: String,
    pub expected: PathBuf,
    scratch_dir: PathBuf,
}

impl TestCase {
    pub fn new(input: &Path, scratch_dir: &Path, expected_suffix: &str) -> Self {
        let name = input
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| input.display().to_string());

        let mut expected = input.as_os_str().to_owned();
        expected.push(expected_suffix);

        Self {
            input: input.to_path_buf(),
            name,
            expected: PathBuf::from(expected),
            scratch_dir: scratch_dir.to_path_buf(),
        }
    }

    /// Compiler output of a valid case, fed to the VM.
    pub fn intermediate(&self) -> PathBuf {
        self.scratch("p")
    }

    /// VM output of a valid case.
    pub fn execute_output(&self) -> PathBuf {
        self.scratch("out")
    }

    /// Compiler output of an invalid case.
    pub fn diagnostic_output(&self) -> PathBuf {
        self.scratch_dir.join(format!("{}_fail.out", self.name))
    }

    /// Where the stderr of the stage writing `output` is kept.
    pub fn stderr_for(output: &Path) -> PathBuf {
        let mut path = output.as_os_str().to_owned();
        path.push(".err");
        PathBuf::from(path)
    }

    /// Fail unless the expected-output fixture is present and readable.
    pub fn ensure_expected(&self) -> Result<(), SetupError> {
        match fs::read(&self.expected) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(SetupError::MissingExpected {
                case: self.name.clone(),
                path: self.expected.clone(),
            }),
            Err(source) => Err(SetupError::UnreadableExpected {
                case: self.name.clone(),
                path: self.expected.clone(),
                source,
            }),
        }
    }

    fn scratch(&self, suffix: &str) -> PathBuf {
        self.scratch_dir.join(format!("{}.{}", self.name, suffix))
    }
}
