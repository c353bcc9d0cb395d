use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright, bright_green, bright_yellow};

/// Progress bar for a paginated download, one tick per page.
pub struct DownloadProgress {
    pb: ProgressBar,
}

impl DownloadProgress {
    pub fn start(pages: usize) -> Self {
        eprintln!("{}  {}", bright("⬇️"), bright("Download").underlined());
        let pb = ProgressBar::new(pages as u64);
        pb.set_draw_target(ProgressDrawTarget::stderr());
        if let Ok(style) =
            ProgressStyle::default_bar().template("  {msg} [{bar:30}] {pos}/{len} pages")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        pb.set_message(bright_yellow("Fetching build results").to_string());
        Self { pb }
    }

    pub fn page_done(&self, file_name: &str) {
        self.pb.set_message(bright_yellow(format!("Wrote {file_name}")).to_string());
        self.pb.inc(1);
    }

    pub fn finish(self, files: usize) {
        self.pb.finish_with_message(
            bright_green(format!("Downloaded {files} pages ✓")).to_string(),
        );
    }
}
