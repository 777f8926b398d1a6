/// Start of the timing report the P-machine appends after program output.
pub const TIMING_MARKER: &str = "--> Execution time";

/// Drop the trailing timing report: everything from the last occurrence of
/// [`TIMING_MARKER`] onwards. Output without the marker is returned as is.
///
/// Works on raw bytes; program output need not be UTF-8.
pub fn strip_timing_report(output: &[u8]) -> &[u8] {
    let marker = TIMING_MARKER.as_bytes();
    match output.windows(marker.len()).rposition(|window| window == marker) {
        Some(idx) => &output[..idx],
        None => output,
    }
}
