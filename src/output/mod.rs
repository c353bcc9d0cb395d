mod exports;
mod graph;
mod progress;
mod styling;
mod summary;
mod tables;

pub use exports::export_report;
pub use progress::DownloadProgress;
pub use summary::{print_summary, render_summary};

use styling::{dim, magenta_bold};

/// Prints the citool banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🔎 citool"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("CircleCI job analysis")
    );
}
