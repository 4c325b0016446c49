//! Observer hooks reporting per-upload ingestion outcomes.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::IngestionError;
use crate::upload::FileFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (batch aborted).
    Error,
    /// Critical error (typically I/O while reading an upload).
    Critical,
}

impl IngestionSeverity {
    /// Severity assigned to a failed batch.
    pub fn for_error(e: &IngestionError) -> Self {
        match e {
            IngestionError::Io(_) => Self::Critical,
            IngestionError::Csv(err) => match err.kind() {
                csv::ErrorKind::Io(_) => Self::Critical,
                _ => Self::Error,
            },
            IngestionError::Excel(_)
            | IngestionError::Json(_)
            | IngestionError::InvalidFormat { .. }
            | IngestionError::SchemaMismatch { .. }
            | IngestionError::InvalidConfig { .. } => Self::Error,
        }
    }
}

/// The upload an event refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionContext {
    /// Client-supplied file name.
    pub file_name: String,
    /// Format inferred from the extension, if it was recognised.
    pub format: Option<FileFormat>,
}

impl IngestionContext {
    pub fn for_file_name(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            format: FileFormat::from_file_name(file_name),
        }
    }
}

/// Minimal stats reported for each processed upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    /// Number of rows extracted from the upload.
    pub rows: usize,
}

/// Why an upload contributed no rows without failing the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Zero-length upload; never opened.
    EmptyUpload,
    /// Workbook has no sheets, or the selected sheet is absent.
    NoWorksheet,
    /// Worksheet has no used cells.
    EmptyWorksheet,
}

/// Observer interface for ingestion outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IngestionObserver: Send + Sync {
    /// Called after an upload's rows were extracted.
    fn on_file_processed(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// Called when an upload is skipped.
    fn on_file_skipped(&self, _ctx: &IngestionContext, _reason: SkipReason) {}

    /// Called when the batch fails on this upload.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_file_processed(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_file_processed(ctx, stats);
        }
    }

    fn on_file_skipped(&self, ctx: &IngestionContext, reason: SkipReason) {
        for o in &self.observers {
            o.on_file_skipped(ctx, reason);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs ingestion events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl IngestionObserver for StdErrObserver {
    fn on_file_processed(&self, ctx: &IngestionContext, stats: IngestionStats) {
        eprintln!(
            "[ingest][ok] format={:?} file={} rows={}",
            ctx.format, ctx.file_name, stats.rows
        );
    }

    fn on_file_skipped(&self, ctx: &IngestionContext, reason: SkipReason) {
        eprintln!(
            "[ingest][skip] format={:?} file={} reason={:?}",
            ctx.format, ctx.file_name, reason
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        eprintln!(
            "[ingest][{:?}] format={:?} file={} err={}",
            severity, ctx.format, ctx.file_name, error
        );
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        eprintln!(
            "[ALERT][ingest][{:?}] format={:?} file={} err={}",
            severity, ctx.format, ctx.file_name, error
        );
    }
}

/// Emits ingestion events through `tracing`, for hosts that already install a subscriber.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_file_processed(&self, ctx: &IngestionContext, stats: IngestionStats) {
        tracing::info!(file = %ctx.file_name, format = ?ctx.format, rows = stats.rows, "upload processed");
    }

    fn on_file_skipped(&self, ctx: &IngestionContext, reason: SkipReason) {
        tracing::debug!(file = %ctx.file_name, format = ?ctx.format, ?reason, "upload skipped");
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        tracing::warn!(file = %ctx.file_name, format = ?ctx.format, ?severity, %error, "upload rejected");
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        tracing::error!(file = %ctx.file_name, format = ?ctx.format, ?severity, %error, "ingestion alert");
    }
}

/// Appends ingestion events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl IngestionObserver for FileObserver {
    fn on_file_processed(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.append_line(&format!(
            "{} ok format={:?} file={} rows={}",
            unix_ts(),
            ctx.format,
            ctx.file_name,
            stats.rows
        ));
    }

    fn on_file_skipped(&self, ctx: &IngestionContext, reason: SkipReason) {
        self.append_line(&format!(
            "{} skip format={:?} file={} reason={:?}",
            unix_ts(),
            ctx.format,
            ctx.file_name,
            reason
        ));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append_line(&format!(
            "{} fail severity={:?} format={:?} file={} err={}",
            unix_ts(),
            severity,
            ctx.format,
            ctx.file_name,
            error
        ));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} format={:?} file={} err={}",
            unix_ts(),
            severity,
            ctx.format,
            ctx.file_name,
            error
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
