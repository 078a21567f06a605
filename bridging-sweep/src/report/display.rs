//! Colored terminal display for sweep reports.
//!
//! Provides rich, colorized output for TTY stderr. Falls back to plain text
//! when stderr is not a terminal or `NO_COLOR` is set.

use std::io::{IsTerminal, Write};

use crate::oracle::Metric;

use super::SweepReport;

// ---------------------------------------------------------------------------
// ANSI escape helpers
// ---------------------------------------------------------------------------

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD_GREEN: &str = "\x1b[1;32m";
    pub const BOLD_YELLOW: &str = "\x1b[1;33m";
    pub const BOLD_CYAN: &str = "\x1b[1;36m";
}

/// Whether to emit ANSI color codes.
fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format a `u64` with comma separators.
fn fmt_num(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Format a duration as a human-readable string.
fn fmt_duration(d: std::time::Duration) -> String {
    let total_ms = d.as_millis();
    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", d.as_secs_f64())
    } else if total_ms < 3_600_000 {
        let mins = d.as_secs() / 60;
        let secs = d.as_secs() % 60;
        format!("{}m {:02}s", mins, secs)
    } else {
        let hours = d.as_secs() / 3600;
        let mins = (d.as_secs() % 3600) / 60;
        format!("{}h {:02}m", hours, mins)
    }
}

// ---------------------------------------------------------------------------
// Section header
// ---------------------------------------------------------------------------

const RULE_WIDTH: usize = 56;

/// Print a section header like: `━━━ Title ━━━━━━━━━━━━━━━━━━━━━━`
fn section_header(w: &mut impl Write, title: &str, color: bool, style: &str) {
    let prefix = "━━━ ";
    let content_len = prefix.chars().count() + title.len() + 1;
    let trail = RULE_WIDTH.saturating_sub(content_len).max(3);
    let rule = "━".repeat(trail);

    if color {
        let _ = writeln!(w, "\n{style}{prefix}{title} {rule}{}", ansi::RESET);
    } else {
        let _ = writeln!(w, "\n{prefix}{title} {rule}");
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Print the sweep report to stderr with colors if supported.
pub fn eprint_report(report: &SweepReport) {
    let color = use_color();
    let mut w = std::io::stderr().lock();
    write_report(&mut w, report, color);
}

/// Render the report into `w`.
pub fn write_report(w: &mut impl Write, report: &SweepReport, color: bool) {
    section_header(w, "Sweep Report", color, ansi::BOLD_CYAN);

    let (icon, icon_color) = if report.combinations > 0 {
        ("✓", ansi::BOLD_GREEN)
    } else {
        ("○", ansi::BOLD_YELLOW)
    };
    let (on, off) = if color {
        (icon_color, ansi::RESET)
    } else {
        ("", "")
    };
    let _ = writeln!(
        w,
        "  {on}{icon}{off} {} combinations   {} runs each   {} runs total   oracle: {}",
        fmt_num(report.combinations as u64),
        report.runs_per_experiment,
        fmt_num(report.total_runs as u64),
        report.oracle,
    );

    let _ = writeln!(w);
    let _ = writeln!(
        w,
        "  Wall Time    {:<14} {} total",
        fmt_duration(report.average_run_time()) + " avg",
        fmt_duration(report.wall_time),
    );

    if let Some(best) = report.best_weighted() {
        section_header(w, "Lowest Weighted Measure", color, ansi::BOLD_CYAN);
        let _ = writeln!(w, "  {}", best.params);
        for metric in Metric::ALL {
            let _ = writeln!(
                w,
                "  {:<20} {}",
                metric.label(),
                best.averages.get(metric)
            );
        }
    }

    section_header(w, "Outputs", color, ansi::BOLD_CYAN);
    let (dim, reset) = if color { (ansi::DIM, ansi::RESET) } else { ("", "") };
    let _ = writeln!(
        w,
        "  summary   {dim}{}{reset}",
        report.summary_path.display()
    );
    for path in &report.raw_paths {
        let _ = writeln!(w, "  raw       {dim}{}{reset}", path.display());
    }

    let _ = writeln!(w);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(0), "0");
        assert_eq!(fmt_num(999), "999");
        assert_eq!(fmt_num(1_000), "1,000");
        assert_eq!(fmt_num(1_234_567), "1,234,567");
    }

    #[test]
    fn test_fmt_duration() {
        assert_eq!(fmt_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(fmt_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(fmt_duration(Duration::from_secs(125)), "2m 05s");
        assert_eq!(fmt_duration(Duration::from_secs(3 * 3600 + 60)), "3h 01m");
    }

    #[test]
    fn test_plain_report_has_no_escapes() {
        let report = SweepReport {
            oracle: "mock".to_string(),
            combinations: 405,
            runs_per_experiment: 1,
            total_runs: 405,
            summary_path: PathBuf::from("summary.csv"),
            raw_paths: vec![PathBuf::from("shape0.txt")],
            ..SweepReport::default()
        };
        let mut out = Vec::new();
        write_report(&mut out, &report, false);
        let text = String::from_utf8(out).expect("utf8");
        assert!(!text.contains('\x1b'));
        assert!(text.contains("405 combinations"));
        assert!(text.contains("raw       shape0.txt"));
    }
}
