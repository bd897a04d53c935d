//! Results log file
//!
//! The log holds the uncoloured text report of each combination followed by
//! its raw observations as CSV, so fits can be re-derived later.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use super::result::MatrixResult;
use crate::output::text;

/// Default results log path
pub const DEFAULT_RESULTS_PATH: &str = "results.log";

/// Header of the per-observation CSV block
pub const OBSERVATION_CSV_HEADER: &str =
    "context,prompt_tokens,cached_prompt_tokens,completion_tokens,response_time_ms";

/// Render the log body for a set of results
pub fn render_results_log(results: &[MatrixResult], include_score: bool) -> String {
    let mut out = String::new();

    for (index, result) in results.iter().enumerate() {
        out.push_str(&text::render_section(index + 1, result, include_score, false));

        if result.error.is_some() {
            continue;
        }

        let _ = writeln!(out, "\n{OBSERVATION_CSV_HEADER}");
        for tagged in &result.observations {
            let obs = &tagged.observation;
            let _ = writeln!(
                out,
                "{},{},{},{},{:.2}",
                tagged.context,
                obs.prompt_tokens,
                obs.cached_prompt_tokens,
                obs.completion_tokens,
                obs.response_time_ms()
            );
        }
    }

    out
}

/// Write the results log, replacing any previous file
pub fn write_results_log(
    path: &Path,
    results: &[MatrixResult],
    include_score: bool,
) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, render_results_log(results, include_score))
        .with_context(|| format!("Failed to write results to: {}", path.display()))?;

    Ok(path.to_path_buf())
}

/// Write a failure note when the matrix could not run at all
pub fn write_failure_log(path: &Path, error: &str) -> Result<()> {
    fs::write(path, format!("Matrix benchmark failed: {error}\n"))
        .with_context(|| format!("Failed to write results to: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures;

    #[test]
    fn test_log_contains_report_and_observations() {
        let results = vec![
            fixtures::result("llama3"),
            fixtures::result("qwen2").with_error("Driver setup failed: boom"),
        ];
        let log = render_results_log(&results, false);

        assert!(log.contains("=== Matrix Combination 1 ==="));
        assert!(log.contains("=== Matrix Combination 2 ==="));
        assert!(log.contains(OBSERVATION_CSV_HEADER));
        assert!(log.contains("short,120,0,1,385.00"));
        assert!(log.contains("long,0,2300,100,5840.00"));
        assert!(log.contains("Error: Driver setup failed: boom"));
        assert_eq!(log.matches(OBSERVATION_CSV_HEADER).count(), 1);
        assert!(!log.contains('\u{1b}'));
    }

    #[test]
    fn test_write_results_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results.log");

        let written = write_results_log(&path, &[fixtures::result("llama3")], true).unwrap();
        assert_eq!(written, path);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Localscore Estimate: 149.45"));
    }

    #[test]
    fn test_write_failure_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.log");

        write_failure_log(&path, "No parameter combinations generated from matrix").unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Matrix benchmark failed: No parameter"));
    }
}
