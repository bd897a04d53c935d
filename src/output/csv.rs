//! CSV renderer

use std::collections::BTreeSet;

use super::ContextMetrics;
use crate::benchmarks::MatrixResult;

/// Metric columns following the parameter columns
pub const METRIC_COLUMNS: [&str; 8] = [
    "short_context_prompt_tokens_per_sec",
    "short_context_cached_prompt_tokens_per_sec",
    "short_context_completion_tokens_per_sec",
    "short_context_r_squared",
    "long_context_prompt_tokens_per_sec",
    "long_context_cached_prompt_tokens_per_sec",
    "long_context_completion_tokens_per_sec",
    "long_context_r_squared",
];

pub const SCORE_COLUMN: &str = "localscore_estimate";

/// Header plus one row per successful combination
///
/// Parameter columns are the sorted union of visible parameters across all
/// results.
pub fn render(results: &[MatrixResult], include_score: bool) -> String {
    let param_keys: BTreeSet<&str> = results
        .iter()
        .flat_map(|r| {
            r.output_flags
                .iter()
                .filter(|(_, visible)| **visible)
                .map(|(key, _)| key.as_str())
        })
        .collect();

    let mut header: Vec<&str> = param_keys.iter().copied().collect();
    header.extend(METRIC_COLUMNS);
    if include_score {
        header.push(SCORE_COLUMN);
    }

    let mut lines = vec![header.join(",")];

    for result in results.iter().filter(|r| r.is_success()) {
        let mut row: Vec<String> = param_keys
            .iter()
            .map(|key| escape(result.params.get(*key).map(String::as_str).unwrap_or("")))
            .collect();

        let short = ContextMetrics::of(result.short_fit.as_ref()).or_zero();
        let long = ContextMetrics::of(result.long_fit.as_ref()).or_zero();
        row.extend(short.iter().chain(long.iter()).map(|v| format!("{v:.2}")));

        if include_score {
            row.push(result.score.map(|s| format!("{s:.2}")).unwrap_or_default());
        }

        lines.push(row.join(","));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Quote a field containing a separator, quote or newline
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures;

    #[test]
    fn test_header_and_row() {
        let csv = render(&[fixtures::result("llama3")], true);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("model,short_context_prompt_tokens_per_sec,"));
        assert!(lines[0].ends_with(",long_context_r_squared,localscore_estimate"));
        assert_eq!(
            lines[1],
            "llama3,333.33,2000.00,40.00,1.00,250.00,1250.00,25.00,0.80,149.45"
        );
    }

    #[test]
    fn test_errors_skipped_and_score_optional() {
        let failed = fixtures::result("b").with_error("boom");
        let mut unscored = fixtures::result("a");
        unscored.score = None;

        let csv = render(&[unscored.clone(), failed], true);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("a,"));
        assert!(lines[1].ends_with(",0.80,"));

        let csv = render(&[unscored], false);
        assert!(!csv.contains(SCORE_COLUMN));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
