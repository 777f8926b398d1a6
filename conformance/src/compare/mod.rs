use std::fs;
use std::path::Path;

use crate::errors::CaseFailure;
use crate::normalize::strip_timing_report;

/// What to do to the actual output before it is compared.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Normalization {
    /// Program output from the VM: drop the trailing timing report.
    StripTimingReport,
    /// Compiler diagnostics: compare verbatim.
    Raw,
}

/// Byte-for-byte equality of `actual` (after `mode`) and `expected`.
pub fn outputs_match(actual: &[u8], expected: &[u8], mode: Normalization) -> bool {
    let actual = match mode {
        Normalization::StripTimingReport => strip_timing_report(actual),
        Normalization::Raw => actual,
    };
    actual == expected
}

/// Read both files and compare them. Either file being unreadable is a
/// failure of its own, not a mismatch.
pub fn compare_files(actual: &Path, expected: &Path, mode: Normalization) -> Result<(), CaseFailure> {
    let actual_bytes = read_output(actual)?;
    let expected_bytes = read_output(expected)?;

    if outputs_match(&actual_bytes, &expected_bytes, mode) {
        Ok(())
    } else {
        Err(CaseFailure::Mismatch {
            actual: actual.to_path_buf(),
            expected: expected.to_path_buf(),
        })
    }
}

fn read_output(path: &Path) -> Result<Vec<u8>, CaseFailure> {
    fs::read(path).map_err(|source| CaseFailure::Unreadable {
        path: path.to_path_buf(),
        source,
    })
}
