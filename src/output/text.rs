//! Human-readable report

use colored::{Color, Colorize};
use std::fmt::Write;
use tabled::{Table, Tabled};

use super::ContextMetrics;
use crate::benchmarks::MatrixResult;
use crate::sampling::ContextClass;

/// Colour band for a fit quality value
pub fn r_squared_color(r_squared: f64) -> Color {
    if r_squared >= 0.9 {
        Color::Green
    } else if r_squared >= 0.7 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Colour band for a composite score
pub fn score_color(score: f64) -> Color {
    if score >= 7.0 {
        Color::Green
    } else if score >= 5.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

#[derive(Debug, Clone, Copy)]
struct Palette {
    enabled: bool,
}

impl Palette {
    fn paint(&self, text: &str, color: Color) -> String {
        if self.enabled {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.enabled {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str, color: Color) -> String {
        if self.enabled {
            text.color(color).bold().to_string()
        } else {
            text.to_string()
        }
    }
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Short context")]
    short: String,
    #[tabled(rename = "Long context")]
    long: String,
}

fn rate_cell(rate: Option<f64>, available: bool) -> String {
    match rate {
        Some(value) if available => format!("{value:.2} tokens/sec"),
        _ => "No data".to_string(),
    }
}

/// Render every combination as a report section
///
/// With `color` off the output carries no escape codes, which is what the
/// results log uses.
pub fn render(results: &[MatrixResult], include_score: bool, color: bool) -> String {
    results
        .iter()
        .enumerate()
        .map(|(index, result)| render_section(index + 1, result, include_score, color))
        .collect()
}

/// Report section for one combination, numbered from 1
pub fn render_section(
    number: usize,
    result: &MatrixResult,
    include_score: bool,
    color: bool,
) -> String {
    let palette = Palette { enabled: color };
    let mut out = String::new();

    let _ = writeln!(
        out,
        "\n{}",
        palette.heading(&format!("=== Matrix Combination {number} ==="), Color::Cyan)
    );
    let _ = writeln!(out, "{}", palette.bold("Parameters:"));
    for (key, value) in result.visible_params() {
        let _ = writeln!(out, "  {}: {}", palette.bold(key), value);
    }

    if let Some(error) = &result.error {
        let _ = writeln!(out, "{}: {}", palette.paint("Error", Color::Red), error);
        return out;
    }

    let short = ContextMetrics::of(result.short_fit.as_ref());
    let long = ContextMetrics::of(result.long_fit.as_ref());
    let has_short = result.short_fit.is_some();
    let has_long = result.long_fit.is_some();

    let rows = vec![
        MetricRow {
            metric: "Prompt processing",
            short: rate_cell(short.prompt_tokens_per_sec, has_short),
            long: rate_cell(long.prompt_tokens_per_sec, has_long),
        },
        MetricRow {
            metric: "Cached prompt processing",
            short: rate_cell(short.cached_prompt_tokens_per_sec, has_short),
            long: rate_cell(long.cached_prompt_tokens_per_sec, has_long),
        },
        MetricRow {
            metric: "Completion generation",
            short: rate_cell(short.completion_tokens_per_sec, has_short),
            long: rate_cell(long.completion_tokens_per_sec, has_long),
        },
    ];
    let _ = writeln!(out, "\n{}", Table::new(rows));

    for (context, metrics) in [(ContextClass::Short, short), (ContextClass::Long, long)] {
        let label = match context {
            ContextClass::Short => "Short context",
            ContextClass::Long => "Long context",
        };
        if result.fit(context).is_some() {
            let value = format!("{:.2}", metrics.r_squared);
            let _ = writeln!(
                out,
                "{} {}: {}",
                palette.bold(label),
                palette.bold("model fit quality (R²)"),
                palette.paint(&value, r_squared_color(metrics.r_squared))
            );
        } else {
            let _ = writeln!(
                out,
                "{}: {}",
                palette.bold(label),
                palette.paint("No data available", Color::Yellow)
            );
        }
    }

    if let Some(score) = result.score.filter(|_| include_score) {
        let _ = writeln!(
            out,
            "\n{}: {}",
            palette.bold("Localscore Estimate"),
            palette.paint(&format!("{score:.2}"), score_color(score))
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures;

    #[test]
    fn test_color_bands() {
        assert_eq!(r_squared_color(0.95), Color::Green);
        assert_eq!(r_squared_color(0.9), Color::Green);
        assert_eq!(r_squared_color(0.75), Color::Yellow);
        assert_eq!(r_squared_color(0.5), Color::Red);

        assert_eq!(score_color(149.45), Color::Green);
        assert_eq!(score_color(6.0), Color::Yellow);
        assert_eq!(score_color(4.99), Color::Red);
    }

    #[test]
    fn test_plain_report() {
        let report = render(&[fixtures::result("llama3")], true, false);

        assert!(report.contains("=== Matrix Combination 1 ==="));
        assert!(report.contains("  model: llama3"));
        assert!(!report.contains("setup_cmd"));
        assert!(report.contains("333.33 tokens/sec"));
        assert!(report.contains("Short context model fit quality (R²): 1.00"));
        assert!(report.contains("Long context model fit quality (R²): 0.80"));
        assert!(report.contains("Localscore Estimate: 149.45"));
        assert!(!report.contains('\u{1b}'));
    }

    #[test]
    fn test_missing_fit_and_error() {
        let mut partial = fixtures::result("a");
        partial.long_fit = None;
        let failed = fixtures::result("b").with_error("Driver setup failed: boom");

        let report = render(&[partial, failed], false, false);

        assert!(report.contains("No data"));
        assert!(report.contains("Long context: No data available"));
        assert!(report.contains("=== Matrix Combination 2 ==="));
        assert!(report.contains("Error: Driver setup failed: boom"));
        assert!(!report.contains("Localscore Estimate"));
    }
}
