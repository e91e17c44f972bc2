//! adaptest-report: Session log export.
//!
//! Writes a finished session log as a spreadsheet-compatible CSV file, as
//! JSON, or as a self-contained HTML summary page.

pub mod csv;
pub mod html;
pub mod sink;

pub use sink::{ExportFormat, FileExportSink};
