//! # Marketpat Warehouse
//!
//! Persistent ticker repository on top of an embedded `DuckDB` database.
//!
//! ## Overview
//!
//! Each ticker is stored as one document in the `tickers` collection, keyed
//! by a unique index on `symbol`. Writes that change the dataset as a whole
//! (`insert_many`, `delete_all`) return hard errors. Per-symbol refreshes and
//! listings degrade: they hand back a best-effort value together with the
//! diagnostics that explain what went wrong.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use marketpat_core::{Symbol, Ticker};
//! use marketpat_warehouse::{CallContext, TickerRepository, WarehouseConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repository = TickerRepository::open(&WarehouseConfig::default())?;
//!     let ctx = CallContext::with_timeout(std::time::Duration::from_secs(5));
//!     repository.init(&ctx);
//!
//!     let ticker = Ticker::with_company(Symbol::parse("AAA")?, "Acme");
//!     let stored = repository.upsert_replace(&ctx, &ticker);
//!     if let Some(ticker) = stored.value() {
//!         println!("stored {}", ticker.symbol());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Collection
//!
//! | Column | Description |
//! |--------|-------------|
//! | `symbol` | Unique ticker symbol (`idx_symbol`) |
//! | `company` | Optional company display name |
//! | `periods` | JSON array of daily periods |
//! | `updated_at` | Last write time |

mod collection;
pub mod context;
pub mod duckdb;
pub mod repository;

use std::env;
use std::path::PathBuf;

use marketpat_core::{Symbol, ValidationError};
use thiserror::Error;

pub use context::CallContext;
pub use duckdb::{DbLocation, DuckDbConnectionManager};
pub use repository::TickerRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A stored period list could not be encoded or decoded.
    #[error("ticker document is not valid: {0}")]
    Document(#[from] serde_json::Error),

    /// A stored symbol no longer passes validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("ticker '{symbol}' not found")]
    TickerNotFound { symbol: Symbol },

    /// Concurrent writers kept winning the symbol index.
    #[error("upsert of '{symbol}' lost to concurrent writers {attempts} times")]
    UpsertConflict { symbol: Symbol, attempts: usize },

    #[error("storage call exceeded its deadline")]
    DeadlineExceeded,

    #[error("storage call was cancelled")]
    Cancelled,
}

/// Configuration for the ticker database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Root directory for marketpat data.
    pub home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections kept in the pool.
    pub max_pool_size: usize,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        let home = resolve_marketpat_home();
        let db_path = home.join("tickers.duckdb");
        Self {
            home,
            db_path,
            max_pool_size: 4,
        }
    }
}

impl WarehouseConfig {
    /// Default configuration with the database file moved to `db_path`.
    #[must_use]
    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }
}

fn resolve_marketpat_home() -> PathBuf {
    if let Some(path) = env::var_os("MARKETPAT_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".marketpat");
    }

    PathBuf::from(".marketpat")
}
