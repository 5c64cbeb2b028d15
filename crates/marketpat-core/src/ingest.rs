//! Ingestion pipeline: raw rows -> normalized periods -> registry.
//!
//! An ingest call runs in two phases. The whole source is read and checked
//! first; only when that succeeds are the periods appended to the symbol's
//! aggregate. A fatal error therefore never leaves a truncated series
//! behind.

use std::convert::Infallible;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::normalize::{normalize_row, RawRow};
use crate::{FieldError, IngestError, Period, Symbol, TickerRegistry};

/// One row of a source, with the line it starts on when the source tracks it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRow {
    pub line: Option<usize>,
    pub fields: Vec<String>,
}

impl From<Vec<String>> for SourceRow {
    fn from(fields: Vec<String>) -> Self {
        Self { line: None, fields }
    }
}

/// A field-level diagnostic tied to its source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowDiagnostic {
    /// 1-based line number, the header being line 1. For CSV this is the
    /// physical line the record starts on, so quoted line breaks and blank
    /// lines are counted.
    pub line: usize,
    #[serde(serialize_with = "serialize_display")]
    pub error: FieldError,
}

/// Outcome of a successful ingest call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub symbol: Symbol,
    /// Rows read from the source, header included.
    pub rows_read: usize,
    pub periods_appended: usize,
    pub diagnostics: Vec<RowDiagnostic>,
}

/// Feeds row sources into a shared [`TickerRegistry`].
#[derive(Debug, Clone)]
pub struct Ingestor {
    registry: Arc<TickerRegistry>,
}

impl Ingestor {
    pub fn new(registry: Arc<TickerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<TickerRegistry> {
        &self.registry
    }

    /// Ingest `rows` for `symbol`. Row 0 is a header and is skipped whatever
    /// it contains. Rows without a known line are numbered by position.
    ///
    /// # Errors
    /// Returns [`IngestError::Source`] when the source fails to yield a row and
    /// [`IngestError::ShortRow`] when a data row has fewer than six fields.
    /// In both cases the registry is left untouched.
    pub fn ingest<I, R, E>(&self, symbol: &Symbol, rows: I) -> Result<IngestReport, IngestError>
    where
        I: IntoIterator<Item = Result<R, E>>,
        R: Into<SourceRow>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let mut rows_read = 0;
        let mut periods = Vec::new();
        let mut diagnostics = Vec::new();

        for (index, row) in rows.into_iter().enumerate() {
            let row: SourceRow = row.map_err(|error| IngestError::Source(Box::new(error)))?.into();
            rows_read += 1;
            if index == 0 {
                continue;
            }

            let line = row.line.unwrap_or(index + 1);
            let found = row.fields.len();
            let raw =
                RawRow::from_fields(row.fields).ok_or(IngestError::ShortRow { line, found })?;
            let (period, errors) = normalize_row(&raw).into_parts();
            for error in errors {
                warn!(%symbol, line, field = error.field(), %error, "field defaulted");
                diagnostics.push(RowDiagnostic { line, error });
            }
            periods.push(period);
        }

        let periods_appended = periods.len();
        self.append(symbol, periods);

        info!(
            %symbol,
            rows = rows_read,
            periods = periods_appended,
            degraded_fields = diagnostics.len(),
            "ingested rows"
        );

        Ok(IngestReport {
            symbol: symbol.clone(),
            rows_read,
            periods_appended,
            diagnostics,
        })
    }

    /// Ingest rows that cannot fail to read.
    pub fn ingest_rows<I>(&self, symbol: &Symbol, rows: I) -> Result<IngestReport, IngestError>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        self.ingest(symbol, rows.into_iter().map(Ok::<_, Infallible>))
    }

    /// Ingest comma-separated rows from `reader`.
    ///
    /// The header may have any number of fields. A data row with fewer than
    /// six is [`IngestError::ShortRow`]; undecodable text is a source error.
    pub fn ingest_csv<R: Read>(
        &self,
        symbol: &Symbol,
        reader: R,
    ) -> Result<IngestReport, IngestError> {
        self.ingest(symbol, csv_rows(reader))
    }

    /// Open `path` and ingest it as CSV.
    pub fn ingest_path(&self, symbol: &Symbol, path: &Path) -> Result<IngestReport, IngestError> {
        let file = File::open(path)?;
        self.ingest_csv(symbol, file)
    }

    fn append(&self, symbol: &Symbol, periods: Vec<Period>) {
        let handle = self.registry.find(symbol);
        self.registry.add_periods(&handle, periods);
    }
}

/// Rows of a CSV source as owned text fields, header included.
pub fn csv_rows<R: Read>(reader: R) -> impl Iterator<Item = Result<SourceRow, csv::Error>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
        .into_records()
        .map(|record| {
            record.map(|record| SourceRow {
                line: record
                    .position()
                    .and_then(|position| usize::try_from(position.line()).ok()),
                fields: record.iter().map(str::to_owned).collect(),
            })
        })
}

fn serialize_display<S>(error: &FieldError, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(error)
}
