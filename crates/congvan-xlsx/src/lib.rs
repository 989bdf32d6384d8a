//! Spreadsheet export for the công văn register.
//!
//! Produces a single-sheet Office Open XML workbook (`.xlsx`): a zip archive
//! of SpreadsheetML parts written with `quick-xml`. Only what the export
//! needs is supported: inline strings, integers, a bold frozen header row
//! and fixed column widths.

pub mod error;
pub mod records;
pub mod sheet;
pub mod writer;

pub use error::{Error, Result};
pub use records::records_sheet;
pub use sheet::{Cell, Sheet};
pub use writer::write_xlsx;

/// MIME type of the produced file.
pub const XLSX_CONTENT_TYPE: &str =
  "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Render records straight to workbook bytes.
pub fn export_records(records: &[congvan_core::record::Record]) -> Result<Vec<u8>> {
  write_xlsx(&records_sheet(records))
}
