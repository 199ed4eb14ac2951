//! Console rendering of a [`BenchReport`].

use std::fmt::Write as _;

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use vecbench_core::{BenchReport, Comparison, Distribution, MetricReport, Verification};

/// Violations listed per metric before the output is truncated.
const MAX_LISTED_VIOLATIONS: usize = 5;

/// Prints the report to stdout.
pub fn print_report(report: &BenchReport) {
    print!("{}", render_report(report));
}

/// Renders the whole report as text.
pub fn render_report(report: &BenchReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", "vecbench".bold());
    let _ = writeln!(
        out,
        "  SIMD level: {}   candidate: {}   reference: {}",
        report.simd_level.to_string().cyan(),
        report.candidate.green(),
        report.reference
    );
    let _ = writeln!(out);

    out.push_str(&config_table(report).to_string());
    out.push('\n');
    out.push_str(&render_preview(report));

    for metric in &report.metrics {
        out.push('\n');
        out.push_str(&render_metric(metric));
    }

    out.push('\n');
    if report.passed() {
        let _ = writeln!(out, "{}", "All metrics within tolerance.".green().bold());
    } else {
        let failed: Vec<String> = report
            .metrics
            .iter()
            .filter(|m| !m.verification.passed)
            .map(|m| m.metric.to_string())
            .collect();
        let _ = writeln!(
            out,
            "{} {}",
            "Out of tolerance:".red().bold(),
            failed.join(", ")
        );
    }
    out
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn config_table(report: &BenchReport) -> Table {
    let config = &report.config;
    let seed = report
        .seed
        .or(config.seed)
        .map_or_else(|| "-".to_string(), |s| s.to_string());

    let mut table = new_table();
    table.set_header(vec!["Setting", "Value"]);
    table.add_row(vec!["dimension".to_string(), config.dimension.to_string()]);
    table.add_row(vec!["corpus size".to_string(), config.corpus_size.to_string()]);
    table.add_row(vec!["iterations".to_string(), config.iterations.to_string()]);
    table.add_row(vec!["warm-up calls".to_string(), config.warmup_rounds.to_string()]);
    table.add_row(vec!["mode".to_string(), config.mode.to_string()]);
    table.add_row(vec!["seed".to_string(), seed]);
    table
}

fn format_components(values: &[f32], remaining: usize) -> String {
    let shown: Vec<String> = values.iter().map(|v| format!("{v:.6}")).collect();
    if remaining > 0 {
        format!("[{}, ... (+{remaining})]", shown.join(", "))
    } else {
        format!("[{}]", shown.join(", "))
    }
}

fn render_preview(report: &BenchReport) -> String {
    let preview = &report.preview;
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Sample data".bold());
    let _ = writeln!(
        out,
        "  query:    {}",
        format_components(&preview.query, preview.remaining_components)
    );
    for (i, row) in preview.rows.iter().enumerate() {
        let _ = writeln!(
            out,
            "  vector {i}: {}",
            format_components(row, preview.remaining_components)
        );
    }
    out
}

fn distribution_cells(label: &str, d: Option<&Distribution>, precision: usize) -> Vec<String> {
    let mut cells = vec![label.to_string()];
    match d {
        Some(d) => cells.extend(
            [d.min, d.mean, d.p95, d.p99, d.max]
                .iter()
                .map(|v| format!("{v:.precision$e}")),
        ),
        None => cells.extend(std::iter::repeat("-".to_string()).take(5)),
    }
    cells
}

fn verification_table(v: &Verification) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Difference", "min", "mean", "p95", "p99", "max"]);
    table.add_row(distribution_cells("absolute", v.absolute.as_ref(), 3));
    table.add_row(distribution_cells("relative (%)", v.relative.as_ref(), 3));
    table
}

fn timing_table(t: &Comparison) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Kernel", "Total (ms)", "Avg / call (ns)", "Checksum"]);
    for timing in [&t.reference, &t.candidate] {
        table.add_row(vec![
            timing.kernel.to_string(),
            format!("{:.3}", timing.elapsed.as_secs_f64() * 1e3),
            format!("{:.2}", timing.average_per_call().as_secs_f64() * 1e9),
            format!("{:.6}", timing.checksum),
        ]);
    }
    table
}

fn render_metric(metric: &MetricReport) -> String {
    let v = &metric.verification;
    let mut out = String::new();

    let status = if v.passed {
        "PASS".green().bold()
    } else {
        "FAIL".red().bold()
    };
    let _ = writeln!(out, "{} {}", metric.metric.to_string().bold(), status);
    let _ = writeln!(
        out,
        "  checked {} vectors, {} violations, {} degenerate, {} on the noise floor \
         (max allowed {}%, noise factor {}, zero threshold {:e})",
        v.checked,
        v.violations.len(),
        v.degenerate,
        v.absolute_rule,
        v.tolerance.max_percent,
        v.tolerance.noise_factor,
        v.tolerance.zero_threshold
    );
    out.push_str(&verification_table(v).to_string());
    out.push('\n');

    for violation in v.violations.iter().take(MAX_LISTED_VIOLATIONS) {
        let _ = writeln!(out, "  {} {violation}", "!".red());
    }
    if v.violations.len() > MAX_LISTED_VIOLATIONS {
        let _ = writeln!(
            out,
            "  ... {} more",
            v.violations.len() - MAX_LISTED_VIOLATIONS
        );
    }

    let t = &metric.timing;
    out.push_str(&timing_table(t).to_string());
    out.push('\n');
    let _ = writeln!(
        out,
        "  speedup: {}   checksum diff: {:.6} ({:.6}%)",
        format!("{:.2}x", t.speedup).cyan().bold(),
        t.checksum_abs_diff,
        t.checksum_percent_diff
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use vecbench_core::{BenchConfig, BenchRunner, Metric};

    fn small_report() -> BenchReport {
        let config = BenchConfig {
            dimension: 12,
            corpus_size: 4,
            iterations: 1,
            warmup_rounds: 0,
            seed: Some(17),
            metrics: vec![Metric::SquaredL2],
            ..BenchConfig::default()
        };
        BenchRunner::new(config).unwrap().run().unwrap()
    }

    #[test]
    fn test_format_components_truncated() {
        assert_eq!(format_components(&[1.0, -0.5], 3), "[1.000000, -0.500000, ... (+3)]");
        assert_eq!(format_components(&[0.25], 0), "[0.250000]");
    }

    #[test]
    fn test_distribution_cells_without_samples() {
        let cells = distribution_cells("absolute", None, 3);
        assert_eq!(cells.len(), 6);
        assert!(cells[1..].iter().all(|c| c == "-"));
    }

    #[test]
    fn test_render_report_sections() {
        let text = render_report(&small_report());
        assert!(text.contains("vecbench"));
        assert!(text.contains("corpus size"));
        assert!(text.contains("Sample data"));
        assert!(text.contains("vector 2"));
        assert!(text.contains("squared-l2"));
        assert!(text.contains("speedup"));
        assert!(text.contains("noise floor"));
        assert!(text.contains("17"));
    }
}
