//! Output formatting for CLI commands.

use comfy_table::{Cell, Color, ContentArrangement, Table};
use waypoint_common::Value;
use waypoint_core::graph::ID_ATTRIBUTE;

/// Output format selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Table,
    Json,
}

impl From<crate::OutputFormat> for Format {
    fn from(f: crate::OutputFormat) -> Self {
        match f {
            crate::OutputFormat::Table => Format::Table,
            crate::OutputFormat::Json => Format::Json,
        }
    }
}

/// Create a styled table with consistent formatting.
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
    table
}

/// Add a header row to a table.
pub fn add_header(table: &mut Table, headers: &[&str]) {
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );
}

/// Short rendering of a value for table cells: documents show their `_id`.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.to_string(),
        Value::Object(_) => value
            .get(ID_ATTRIBUTE)
            .and_then(Value::as_str)
            .map_or_else(|| value.to_string(), str::to_string),
        _ => value.to_string(),
    }
}

/// Print a status message (respects quiet mode).
pub fn status(msg: &str, quiet: bool) {
    if !quiet {
        println!("{msg}");
    }
}

/// Print a warning message (respects quiet mode).
pub fn warning(msg: &str, quiet: bool) {
    if !quiet {
        eprintln!("! {msg}");
    }
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("✗ {msg}");
}
