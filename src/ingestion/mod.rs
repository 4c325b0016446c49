//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`SpreadsheetIngestor`] (from [`ingestor`]) which:
//!
//! - checks every upload's extension before parsing anything
//! - reads the selected worksheet of each upload into a cell grid
//! - validates the header row and extracts rows into a [`crate::types::ResultSet`]
//! - optionally reports per-file outcomes to an [`IngestionObserver`]
//!
//! Lower-level pieces are also available under:
//! - [`excel`] and [`csv`]: bytes to worksheet grid
//! - [`extract`]: header validation and row extraction
//! - [`dates`]: OLE Automation serial dates

pub mod csv;
pub mod dates;
pub mod excel;
pub mod extract;
pub mod ingestor;
pub mod observability;

pub use ingestor::{process_files, IngestionOptions, SheetSelection, SpreadsheetIngestor, DEFAULT_DATE_FORMAT};
pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    SkipReason, StdErrObserver, TracingObserver,
};
