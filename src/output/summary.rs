use std::fmt::Write;

use comfy_table::{Cell, Table};

use crate::config::AnalysisConfig;
use crate::insights::{AnalysisReport, SeriesReport};

use super::graph::plot;
use super::styling::{bright, cyan, dim};
use super::tables::{color_coded_success_cell, create_table, cyan_header, format_duration};

/// Prints a human-readable summary of the analysis to stdout.
///
/// Sections are only shown when the report contains them:
/// - Success Rate: lowest failure rate first
/// - Average Duration: slowest job first
/// - Duration Trends / Success Trends: one graph per job, chronological
pub fn print_summary(report: &AnalysisReport, config: &AnalysisConfig) {
    println!("{}", render_summary(report, config, true));
}

fn section_table(styled: bool) -> Table {
    let mut table = create_table();
    if !styled {
        table.force_no_tty();
    }
    table
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

/// Renders the summary. With `styled` off the tables carry no ANSI styling,
/// whatever stdout is attached to.
pub fn render_summary(report: &AnalysisReport, config: &AnalysisConfig, styled: bool) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "{} {} ({} after filtering)\n",
        cyan("•"),
        bright(format!("Number of job results: {}", report.total_records)),
        report.filtered_records
    );

    if !report.success_rates.is_empty() {
        add_section_header(&mut output, "✅", "Job Success Rate");
        let mut table = section_table(styled);
        table.set_header(cyan_header(&["#", "Job name", "Success Rate"]));
        for (idx, job) in report.success_rates.iter().enumerate() {
            table.add_row(vec![
                Cell::new(idx + 1),
                Cell::new(&job.name),
                color_coded_success_cell(job.display(), job.success_percent),
            ]);
        }
        let _ = writeln!(output, "{table}\n");
    }

    if !report.durations.is_empty() {
        add_section_header(&mut output, "⏱️", "Average Job Duration");
        let mut table = section_table(styled);
        table.set_header(cyan_header(&["#", "Job name", "Average job duration", "Runs"]));
        for (idx, job) in report.durations.iter().enumerate() {
            table.add_row(vec![
                Cell::new(idx + 1),
                Cell::new(&job.name),
                Cell::new(format_duration(job.rounded_seconds)),
                Cell::new(job.frequency),
            ]);
        }
        let _ = writeln!(output, "{table}\n");
    }

    if !report.duration_series.is_empty() {
        add_section_header(&mut output, "📈", "Job Duration Trends (seconds)");
        render_graphs(&mut output, &report.duration_series, config);
    }

    if !report.success_series.is_empty() {
        add_section_header(&mut output, "📊", "Job Success Trends (1 = success)");
        render_graphs(&mut output, &report.success_series, config);
    }

    output
}

fn render_graphs(output: &mut String, series: &[SeriesReport], config: &AnalysisConfig) {
    for s in series {
        let _ = writeln!(
            output,
            "\nJob name: {} {}\n",
            bright(&s.name),
            dim(format!("({} data points)", s.points.len()))
        );
        let width = s.points.len().min(config.max_graph_width);
        output.push_str(&plot(&s.points, width, config.max_graph_height));
    }
    output.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::{JobDuration, JobSuccessRate};
    use chrono::Utc;

    fn report() -> AnalysisReport {
        AnalysisReport {
            generated_at: Utc::now(),
            total_records: 3,
            filtered_records: 2,
            durations: vec![JobDuration {
                name: "build".to_string(),
                average_seconds: 7.5,
                rounded_seconds: 8,
                frequency: 2,
            }],
            success_rates: vec![JobSuccessRate {
                name: "build".to_string(),
                success_count: 1,
                total_count: 2,
                success_percent: 50,
            }],
            duration_series: vec![SeriesReport {
                name: "build".to_string(),
                samples: 1,
                points: vec![10.0],
            }],
            success_series: Vec::new(),
        }
    }

    #[test]
    fn test_summary_contains_every_present_section() {
        console::set_colors_enabled(false);

        let text = render_summary(&report(), &AnalysisConfig::default(), true);

        assert!(text.contains("Number of job results: 3"));
        assert!(text.contains("1/2 (50%)"));
        assert!(text.contains("8s"));
        assert!(text.contains("Job name: build"));
        assert!(text.contains("(1 data points)"));
        assert!(!text.contains("Job Success Trends"));
    }

    #[test]
    fn test_unstyled_summary_has_no_escape_codes() {
        console::set_colors_enabled(false);

        let text = render_summary(&report(), &AnalysisConfig::default(), false);

        assert!(text.contains("1/2 (50%)"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn test_empty_sections_are_skipped() {
        console::set_colors_enabled(false);
        let mut report = report();
        report.durations.clear();
        report.success_rates.clear();
        report.duration_series.clear();

        let text = render_summary(&report, &AnalysisConfig::default(), true);

        assert!(!text.contains("Job Success Rate"));
        assert!(!text.contains("Average Job Duration"));
        assert!(!text.contains("Job Duration Trends"));
    }
}
