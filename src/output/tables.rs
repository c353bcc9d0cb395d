use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn color_coded_success_cell(text: String, percent: u64) -> Cell {
    if percent > 80 {
        Cell::new(text).fg(TableColor::Green)
    } else if percent >= 50 {
        Cell::new(text).fg(TableColor::Yellow)
    } else {
        Cell::new(text).fg(TableColor::Red)
    }
}

/// Compact duration such as `1h2m3s`, `4m0s` or `7s`.
pub fn format_duration(total_seconds: i64) -> String {
    let sign = if total_seconds < 0 { "-" } else { "" };
    let seconds = total_seconds.unsigned_abs();
    let (hours, minutes, seconds) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);

    if hours > 0 {
        format!("{sign}{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{sign}{minutes}m{seconds}s")
    } else {
        format!("{sign}{seconds}s")
    }
}
