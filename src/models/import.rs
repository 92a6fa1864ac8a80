use serde::Serialize;

/// Outcome of one pass over the readings spreadsheet.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub rows_read: usize,
    pub imported: usize,
    pub skipped: usize,
    pub watermark: i64,
}
