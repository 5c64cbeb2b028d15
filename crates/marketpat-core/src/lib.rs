//! # Marketpat Core
//!
//! Ticker domain model and the ingestion side of marketpat.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`domain`] | `Symbol`, `Period`, `Ticker`, `TickerSymbolCompany` |
//! | [`diagnosed`] | Value-plus-diagnostics results for degrading operations |
//! | [`normalize`] | Raw text row -> `Period` |
//! | [`registry`] | In-memory symbol -> `Ticker` map with per-symbol locks |
//! | [`ingest`] | Row sources (plain rows, CSV) -> registry |
//! | [`error`] | Validation, field and ingestion errors |
//!
//! ## Data flow
//!
//! ```text
//! CSV rows ──▶ normalize_row ──▶ Period ──▶ TickerRegistry ──▶ repository
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use marketpat_core::{Ingestor, Symbol, TickerRegistry};
//!
//! let registry = Arc::new(TickerRegistry::new());
//! let ingestor = Ingestor::new(Arc::clone(&registry));
//! let csv = "Date,Open,High,Low,Close,Volume\n2020-01-02,10,12,9,11,1000\n";
//!
//! let symbol = Symbol::parse("ibm")?;
//! let report = ingestor.ingest_csv(&symbol, csv.as_bytes())?;
//! assert_eq!(report.periods_appended, 1);
//! assert_eq!(registry.find_names(), ["IBM"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod diagnosed;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod normalize;
pub mod registry;

pub use diagnosed::Diagnosed;
pub use domain::{symbol_from_path, Period, Symbol, Ticker, TickerSymbolCompany, DATE_FORMAT};
pub use error::{FieldError, IngestError, ValidationError};
pub use ingest::{csv_rows, IngestReport, Ingestor, RowDiagnostic, SourceRow};
pub use normalize::{normalize_row, RawRow};
pub use registry::{TickerHandle, TickerRegistry};
