//! Batch entrypoint.
//!
//! Most callers should use [`SpreadsheetIngestor::process_files`], which validates every
//! upload's extension, then extracts the selected worksheet of each non-empty upload in input
//! order into one [`ResultSet`].
//!
//! - Any unsupported extension aborts the batch before anything is parsed.
//! - Any header mismatch or parse failure aborts the batch; no partial result is returned.
//! - If an [`IngestionObserver`] is configured, per-file outcomes and failures are reported.

use std::fmt;
use std::sync::Arc;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{ExtractionSchema, ResultSet, Row};
use crate::upload::{self, FileFormat, UploadedFile};

use super::dates;
use super::extract;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats, SkipReason};
use super::{csv, excel};

/// Default rendering of converted dates (`31/12/1899 00:00:00`).
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Which worksheet of a workbook is read. CSV uploads always have exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SheetSelection {
    /// The first sheet in workbook order (default). Later sheets are ignored.
    #[default]
    First,
    /// A single named sheet. Workbooks without it contribute no rows.
    Named(String),
}

/// Options controlling ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// Worksheet read from each workbook.
    pub sheet_selection: SheetSelection,
    /// Field delimiter for `.csv` uploads.
    pub csv_delimiter: u8,
    /// strftime pattern used to store converted dates.
    pub date_format: String,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("sheet_selection", &self.sheet_selection)
            .field("csv_delimiter", &char::from(self.csv_delimiter))
            .field("date_format", &self.date_format)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            sheet_selection: SheetSelection::default(),
            csv_delimiter: b',',
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Validates and extracts batches of uploaded spreadsheets.
///
/// Holds no state between calls; processing the same uploads twice yields the same rows.
///
/// # Examples
///
/// ```
/// use spreadsheet_ingest::ingestion::SpreadsheetIngestor;
/// use spreadsheet_ingest::upload::InMemoryUpload;
///
/// # fn main() -> Result<(), spreadsheet_ingest::IngestionError> {
/// let csv = "Documento,Razão Social,CEP,Produto,Número do pedido,Data\n\
///            123.456.789-00,ACME,12345-678,Caneta,42,45000\n";
/// let files = vec![InMemoryUpload::new("pedidos.csv", csv.as_bytes().to_vec())];
///
/// let rows = SpreadsheetIngestor::default().process_files(&files)?;
/// assert_eq!(rows.row_count(), 1);
/// assert_eq!(rows.rows()[0].get("Documento"), Some("12345678900"));
/// assert_eq!(rows.rows()[0].get("Data"), Some("15/03/2023 00:00:00"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SpreadsheetIngestor {
    schema: ExtractionSchema,
    options: IngestionOptions,
}

impl SpreadsheetIngestor {
    /// Create an ingestor, rejecting an unusable schema or date format.
    pub fn new(schema: ExtractionSchema, options: IngestionOptions) -> IngestionResult<Self> {
        schema.validate()?;
        if !dates::is_valid_format(&options.date_format) {
            return Err(IngestionError::InvalidConfig {
                message: format!("invalid date format '{}'", options.date_format),
            });
        }
        Ok(Self { schema, options })
    }

    pub fn schema(&self) -> &ExtractionSchema {
        &self.schema
    }

    pub fn options(&self) -> &IngestionOptions {
        &self.options
    }

    /// `true` if every upload has a supported extension; vacuously `true` for no uploads.
    pub fn validate_file_types<F: UploadedFile>(&self, files: &[F]) -> bool {
        upload::validate_file_types(files)
    }

    /// Extract every upload into one result set, in file order then row order.
    pub fn process_files<F: UploadedFile>(&self, files: &[F]) -> IngestionResult<ResultSet> {
        if let Some(bad) = upload::first_invalid(files) {
            let err = IngestionError::InvalidFormat {
                file_name: bad.file_name().to_string(),
            };
            self.report_failure(&IngestionContext::for_file_name(bad.file_name()), &err);
            return Err(err);
        }

        let mut out = ResultSet::default();
        for file in files {
            let ctx = IngestionContext::for_file_name(file.file_name());
            match self.process_file(file, &ctx) {
                Ok(rows) => out.extend(rows),
                Err(e) => {
                    self.report_failure(&ctx, &e);
                    return Err(e);
                }
            }
        }
        Ok(out)
    }

    fn process_file<F: UploadedFile>(&self, file: &F, ctx: &IngestionContext) -> IngestionResult<Vec<Row>> {
        if file.is_empty() {
            self.report_skip(ctx, SkipReason::EmptyUpload);
            return Ok(Vec::new());
        }
        let Some(format) = ctx.format else {
            // Extensions were checked before the loop.
            return Err(IngestionError::InvalidFormat {
                file_name: ctx.file_name.clone(),
            });
        };

        let bytes = file.read_bytes()?;
        let range = match format {
            FileFormat::Csv => csv::worksheet_from_bytes(&bytes, self.options.csv_delimiter)?,
            FileFormat::Xlsx | FileFormat::Xls => {
                match excel::worksheet_from_bytes(bytes, &self.options.sheet_selection)? {
                    Some(range) => range,
                    None => {
                        self.report_skip(ctx, SkipReason::NoWorksheet);
                        return Ok(Vec::new());
                    }
                }
            }
        };

        if range.is_empty() {
            self.report_skip(ctx, SkipReason::EmptyWorksheet);
            return Ok(Vec::new());
        }

        let rows = extract::extract_sheet(&ctx.file_name, &range, &self.schema, &self.options.date_format)?;
        if let Some(obs) = self.options.observer.as_ref() {
            obs.on_file_processed(ctx, IngestionStats { rows: rows.len() });
        }
        Ok(rows)
    }

    fn report_skip(&self, ctx: &IngestionContext, reason: SkipReason) {
        if let Some(obs) = self.options.observer.as_ref() {
            obs.on_file_skipped(ctx, reason);
        }
    }

    fn report_failure(&self, ctx: &IngestionContext, e: &IngestionError) {
        if let Some(obs) = self.options.observer.as_ref() {
            let sev = IngestionSeverity::for_error(e);
            obs.on_failure(ctx, sev, e);
            if sev >= self.options.alert_at_or_above {
                obs.on_alert(ctx, sev, e);
            }
        }
    }
}

/// Process uploads with the default schema and options.
pub fn process_files<F: UploadedFile>(files: &[F]) -> IngestionResult<ResultSet> {
    SpreadsheetIngestor::default().process_files(files)
}
