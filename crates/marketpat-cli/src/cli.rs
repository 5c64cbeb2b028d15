//! CLI argument definitions for marketpat.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `load` | Ingest daily price CSV files and store the tickers |
//! | `symbols` | List stored symbols |
//! | `companies` | List stored symbols with company names |
//! | `names` | Sorted display names of stored tickers |
//! | `show` | Print one stored ticker |
//! | `set-company` | Set the company name of a ticker |
//! | `reset` | Drop every stored ticker |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--db` | `$MARKETPAT_HOME/tickers.duckdb` | Database file |
//! | `--timeout-ms` | `5000` | Deadline for each storage call |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--log-level` | `RUST_LOG` or `info` | Log filter for stderr |
//!
//! # Examples
//!
//! ```bash
//! marketpat load data/ibm.csv data/msft.csv
//! marketpat set-company IBM "International Business Machines"
//! marketpat companies --pretty
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

/// Market pattern ticker store.
#[derive(Debug, Parser)]
#[command(
    name = "marketpat",
    author,
    version,
    about = "Load daily price history from CSV files and manage the stored tickers"
)]
pub struct Cli {
    /// Database file (overrides `$MARKETPAT_HOME`).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Deadline for each storage call in milliseconds.
    #[arg(long, global = true, default_value_t = 5000)]
    pub timeout_ms: u64,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Log filter, e.g. `debug` or `marketpat_warehouse=debug`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest CSV files (symbol taken from each file name) and store them.
    Load(LoadArgs),
    /// List stored symbols.
    Symbols,
    /// List stored symbols with their company names, sorted by symbol.
    Companies,
    /// Sorted names of stored tickers.
    Names,
    /// Print one stored ticker with its periods.
    Show(ShowArgs),
    /// Set the company name of a ticker, creating it if absent.
    SetCompany(SetCompanyArgs),
    /// Drop every stored ticker.
    Reset,
}

impl Command {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Load(_) => "load",
            Self::Symbols => "symbols",
            Self::Companies => "companies",
            Self::Names => "names",
            Self::Show(_) => "show",
            Self::SetCompany(_) => "set-company",
            Self::Reset => "reset",
        }
    }
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// CSV files with a header row and `date,open,high,low,close,volume` rows.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Drop the collection and bulk insert instead of upserting per ticker.
    #[arg(long, default_value_t = false)]
    pub reload: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    pub symbol: String,
}

#[derive(Debug, Args)]
pub struct SetCompanyArgs {
    pub symbol: String,
    pub company: String,
}
