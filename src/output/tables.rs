use chrono::{DateTime, Utc};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::models::CanonicalStatus;

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

fn status_color(status: CanonicalStatus) -> TableColor {
    match status {
        CanonicalStatus::Success => TableColor::Green,
        CanonicalStatus::Failure => TableColor::Red,
        CanonicalStatus::Unstable => TableColor::Yellow,
        CanonicalStatus::Running => TableColor::Blue,
        CanonicalStatus::Aborted | CanonicalStatus::NotBuilt | CanonicalStatus::Unknown => {
            TableColor::Grey
        }
    }
}

pub fn status_cell(status: CanonicalStatus) -> Cell {
    Cell::new(status.as_str()).fg(status_color(status))
}

/// A build result; `None` means the build has not finished yet.
pub fn result_cell(result: Option<CanonicalStatus>) -> Cell {
    result.map_or_else(
        || Cell::new("IN PROGRESS").fg(TableColor::Blue),
        status_cell,
    )
}

#[allow(clippy::cast_precision_loss)]
pub fn duration_cell(duration_ms: Option<u64>) -> Cell {
    match duration_ms {
        Some(ms) => Cell::new(format!("{:.1}min", ms as f64 / 60_000.0)),
        None => Cell::new("-"),
    }
}

pub fn timestamp_cell(timestamp_ms: Option<i64>) -> Cell {
    let text = timestamp_ms
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
    Cell::new(text)
}
