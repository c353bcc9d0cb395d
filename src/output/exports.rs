use anyhow::Result;
use std::io::Write;

use crate::config::OutputFormat;
use crate::insights::AnalysisReport;

/// Exports an analysis report in a machine-readable format.
///
/// - JSON: the whole report, including trend series
/// - CSV: duration and success-rate rankings as two sections
pub fn export_report(
    report: &AnalysisReport,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Summary => {
            unreachable!("Summary format should be handled in CLI")
        }
        OutputFormat::Json => export_json(report, pretty, output),
        OutputFormat::Csv => export_csv(report, output),
    }
}

fn export_json(report: &AnalysisReport, pretty: bool, output: &mut dyn Write) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    writeln!(output, "{json}")?;
    Ok(())
}

fn export_csv(report: &AnalysisReport, output: &mut dyn Write) -> Result<()> {
    if !report.durations.is_empty() {
        writeln!(output, "Job Name,Average Duration (s),Rounded Duration (s),Runs")?;
        for job in &report.durations {
            writeln!(
                output,
                "{},{:.3},{},{}",
                csv_field(&job.name),
                job.average_seconds,
                job.rounded_seconds,
                job.frequency
            )?;
        }
    }

    if !report.success_rates.is_empty() {
        if !report.durations.is_empty() {
            writeln!(output)?;
        }
        writeln!(output, "Job Name,Successes,Total,Success Rate (%)")?;
        for job in &report.success_rates {
            writeln!(
                output,
                "{},{},{},{}",
                csv_field(&job.name),
                job.success_count,
                job.total_count,
                job.success_percent
            )?;
        }
    }

    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
