use std::fmt::Write;

const POINT: char = '●';
const RISE: char = '│';

/// Renders `values` as an ASCII line graph `width` columns wide and `height` rows tall,
/// with a labelled y axis on the left.
///
/// Series longer than `width` are resampled by linear interpolation.
pub fn plot(values: &[f64], width: usize, height: usize) -> String {
    if values.is_empty() || width == 0 || height == 0 {
        return String::new();
    }

    let columns = resample(values, width);
    let min = columns.iter().copied().fold(f64::INFINITY, f64::min);
    let max = columns.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let rows: Vec<usize> = columns
        .iter()
        .map(|&value| row_of(value, min, max, height))
        .collect();

    let mut grid = vec![vec![' '; width]; height];
    for (column, &row) in rows.iter().enumerate() {
        if column > 0 {
            let previous = rows[column - 1];
            let (low, high) = (previous.min(row), previous.max(row));
            for fill in (low + 1)..high {
                grid[fill][column] = RISE;
            }
        }
        grid[row][column] = POINT;
    }

    let labels: Vec<String> = (0..height)
        .map(|row| format!("{:.2}", value_of(row, min, max, height)))
        .collect();
    let label_width = labels.iter().map(String::len).max().unwrap_or(0);

    let mut output = String::new();
    for row in (0..height).rev() {
        let line: String = grid[row].iter().collect();
        let _ = writeln!(
            output,
            "{:>label_width$} ┤{}",
            labels[row],
            line.trim_end()
        );
    }
    output
}

#[allow(clippy::cast_precision_loss)]
fn resample(values: &[f64], width: usize) -> Vec<f64> {
    if values.len() == width {
        return values.to_vec();
    }
    if values.len() == 1 || width == 1 {
        return vec![values[0]; width];
    }

    let scale = (values.len() - 1) as f64 / (width - 1) as f64;
    (0..width)
        .map(|column| {
            let position = column as f64 * scale;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let left = (position.floor() as usize).min(values.len() - 1);
            let right = (left + 1).min(values.len() - 1);
            let fraction = position - left as f64;
            values[left] + (values[right] - values[left]) * fraction
        })
        .collect()
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn row_of(value: f64, min: f64, max: f64, height: usize) -> usize {
    if max <= min || height == 1 {
        return 0;
    }
    let scaled = (value - min) / (max - min) * (height - 1) as f64;
    (scaled.round() as usize).min(height - 1)
}

#[allow(clippy::cast_precision_loss)]
fn value_of(row: usize, min: f64, max: f64, height: usize) -> f64 {
    if height == 1 {
        return min;
    }
    min + (max - min) * row as f64 / (height - 1) as f64
}
