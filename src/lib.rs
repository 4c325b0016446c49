//! `spreadsheet-ingest` turns batches of uploaded order spreadsheets into an in-memory
//! [`types::ResultSet`], after checking each upload's extension and header row.
//!
//! The primary entrypoint is [`ingestion::SpreadsheetIngestor::process_files`].
//!
//! ## What you can ingest
//!
//! **Upload formats (recognised by extension, case-insensitive):**
//!
//! - **Workbooks**: `.xlsx`, `.xls` (only the first worksheet is read by default)
//! - **CSV**: `.csv`
//!
//! **Default layout ([`types::ExtractionSchema::default`]):**
//!
//! | Column | Required header | Output key | Cleanup |
//! |---|---|---|---|
//! | 1 | `Documento` | `Documento` | `.` and `-` removed |
//! | 2 | `Razão Social` | `Razão social` | none |
//! | 3 | `CEP` | `CEP` | `-` removed |
//! | 4 | `Produto` | `Produto` | none |
//! | 5 | `Número do pedido` | `Número do pedido` | none |
//! | 6 | `Data` | `Data` | OLE serial date, else 1900-01-01 |
//!
//! Headers are checked by presence anywhere in row 1; values are read from the fixed column
//! positions. Extraction of a worksheet stops at the first row whose non-date cells are all
//! blank.
//!
//! ## Quick example
//!
//! ```no_run
//! use spreadsheet_ingest::ingestion::SpreadsheetIngestor;
//! use spreadsheet_ingest::upload::PathUpload;
//!
//! # fn main() -> Result<(), spreadsheet_ingest::IngestionError> {
//! let files = vec![PathUpload::open("pedidos.xlsx")?];
//! let rows = SpreadsheetIngestor::default().process_files(&files)?;
//! println!("{}", rows.to_json()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom layout
//!
//! ```rust
//! use spreadsheet_ingest::ingestion::{IngestionOptions, SpreadsheetIngestor};
//! use spreadsheet_ingest::types::ExtractionSchema;
//!
//! # fn main() -> Result<(), spreadsheet_ingest::IngestionError> {
//! let schema = ExtractionSchema::from_json_str(
//!     r#"{"columns": [
//!         {"header": "Pedido", "key": "pedido", "position": 1},
//!         {"header": "Emissão", "key": "emissao", "position": 2, "rule": {"rule": "ole_date"}}
//!     ]}"#,
//! )?;
//! let opts = IngestionOptions {
//!     csv_delimiter: b';',
//!     date_format: "%Y-%m-%d".to_string(),
//!     ..Default::default()
//! };
//! let ingestor = SpreadsheetIngestor::new(schema, opts)?;
//! assert_eq!(ingestor.schema().columns.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: batch entrypoint, worksheet loading, extraction, observers
//! - [`upload`]: uploaded-file contract and extension checks
//! - [`types`]: extraction schema and result types
//! - [`error`]: error type shared by the crate

pub mod error;
pub mod ingestion;
pub mod types;
pub mod upload;

pub use error::{IngestionError, IngestionResult};
