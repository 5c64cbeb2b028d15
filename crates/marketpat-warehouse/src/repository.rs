//! Ticker repository.
//!
//! Dataset-wide writes (`insert_many`, `delete_all`) propagate their errors.
//! Per-symbol upserts and all reads degrade to a best-effort value plus
//! diagnostics, each of which is also logged at `WARN`.

use std::fs;

use ::duckdb::{params, Connection, OptionalExt, Row};
use marketpat_core::{Diagnosed, Period, Symbol, Ticker, TickerSymbolCompany};
use tracing::{debug, error, warn};

use crate::collection::{collection_exists, drop_collection, ensure_collection, SYMBOL_INDEX};
use crate::{CallContext, DuckDbConnectionManager, WarehouseConfig, WarehouseError};

const MAX_UPSERT_ATTEMPTS: usize = 3;
const IN_MEMORY_POOL_SIZE: usize = 4;

const INSERT_TICKER: &str =
    "INSERT INTO tickers (symbol, company, periods, updated_at) VALUES (?, ?, ?, CURRENT_TIMESTAMP)";
const REPLACE_TICKER: &str =
    "UPDATE tickers SET company = ?, periods = ?, updated_at = CURRENT_TIMESTAMP WHERE symbol = ?";
const SET_PERIODS: &str =
    "UPDATE tickers SET periods = ?, updated_at = CURRENT_TIMESTAMP WHERE symbol = ?";
const SET_COMPANY: &str =
    "UPDATE tickers SET company = ?, updated_at = CURRENT_TIMESTAMP WHERE symbol = ?";
const SELECT_TICKER: &str = "SELECT symbol, company, periods FROM tickers WHERE symbol = ?";

/// Ticker documents keyed by symbol.
#[derive(Clone)]
pub struct TickerRepository {
    manager: DuckDbConnectionManager,
}

/// A document as read back, before validation.
struct StoredTicker {
    symbol: String,
    company: Option<String>,
    periods: String,
}

impl StoredTicker {
    fn from_row(row: &Row<'_>) -> Result<Self, ::duckdb::Error> {
        Ok(Self {
            symbol: row.get(0)?,
            company: row.get(1)?,
            periods: row.get(2)?,
        })
    }

    fn into_ticker(self) -> Result<Ticker, WarehouseError> {
        let symbol = Symbol::parse(&self.symbol)?;
        let periods: Vec<Period> = serde_json::from_str(&self.periods)?;
        Ok(Ticker::from_parts(symbol, self.company, periods))
    }
}

impl TickerRepository {
    /// Open the repository at `config.db_path`, creating parent directories.
    ///
    /// # Errors
    /// Returns an error if the directory or database cannot be created.
    pub fn open(config: &WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let manager = DuckDbConnectionManager::open(config.db_path.clone(), config.max_pool_size)?;
        Ok(Self { manager })
    }

    /// # Errors
    /// Returns an error if `DuckDB` cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, WarehouseError> {
        let manager = DuckDbConnectionManager::open_in_memory(IN_MEMORY_POOL_SIZE)?;
        Ok(Self { manager })
    }

    pub fn manager(&self) -> &DuckDbConnectionManager {
        &self.manager
    }

    /// Ensure the collection and its unique symbol index exist.
    ///
    /// Safe to call on every startup. Failures are logged, never returned.
    pub fn init(&self, ctx: &CallContext) {
        let result = ctx.check().and_then(|()| {
            self.with_connection(|connection| {
                ensure_collection(connection)?;
                Ok(())
            })
        });
        match result {
            Ok(()) => debug!(index = SYMBOL_INDEX, "ticker collection ready"),
            Err(error) => error!(index = SYMBOL_INDEX, %error, "failed to create symbol index"),
        }
    }

    /// Insert every ticker in one transaction. Nothing is stored if any
    /// insert fails, including a symbol that already exists.
    ///
    /// # Errors
    /// Returns the first storage error, or the context error if the call
    /// expired or was cancelled.
    pub fn insert_many(
        &self,
        ctx: &CallContext,
        tickers: &[Ticker],
    ) -> Result<(), WarehouseError> {
        ctx.check()?;
        if tickers.is_empty() {
            return Ok(());
        }

        let mut documents = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            documents.push((ticker, serde_json::to_string(ticker.periods())?));
        }

        self.with_connection(|connection| {
            ensure_collection(connection)?;
            in_transaction(connection, ctx, |connection| {
                let mut statement = connection.prepare(INSERT_TICKER)?;
                for (ticker, periods) in &documents {
                    statement.execute(params![
                        ticker.symbol().as_str(),
                        ticker.company(),
                        periods
                    ])?;
                }
                Ok(())
            })
        })?;

        debug!(count = tickers.len(), "inserted tickers");
        Ok(())
    }

    /// Drop the whole collection.
    ///
    /// # Errors
    /// Returns the storage error, or the context error.
    pub fn delete_all(&self, ctx: &CallContext) -> Result<(), WarehouseError> {
        ctx.check()?;
        self.with_connection(|connection| {
            drop_collection(connection)?;
            Ok(())
        })?;
        debug!("dropped ticker collection");
        Ok(())
    }

    /// Replace the whole document for the ticker's symbol, creating it when
    /// absent, and return the stored post-image.
    ///
    /// A `None` value means the write did not happen; the diagnostics say why.
    pub fn upsert_replace(
        &self,
        ctx: &CallContext,
        ticker: &Ticker,
    ) -> Diagnosed<Option<Ticker>, WarehouseError> {
        let symbol = ticker.symbol();
        let result = serde_json::to_string(ticker.periods())
            .map_err(WarehouseError::from)
            .and_then(|periods| {
                self.upsert(ctx, symbol, |connection| {
                    let replaced = connection.execute(
                        REPLACE_TICKER,
                        params![ticker.company(), periods, symbol.as_str()],
                    )?;
                    if replaced == 0 {
                        connection.execute(
                            INSERT_TICKER,
                            params![symbol.as_str(), ticker.company(), periods],
                        )?;
                    }
                    Ok(())
                })
            });
        settle_write("upsert_replace", symbol, result)
    }

    /// Replace only the period history, keeping any stored company. An absent
    /// symbol is created with the ticker's own company.
    pub fn upsert_periods(
        &self,
        ctx: &CallContext,
        ticker: &Ticker,
    ) -> Diagnosed<Option<Ticker>, WarehouseError> {
        let symbol = ticker.symbol();
        let result = serde_json::to_string(ticker.periods())
            .map_err(WarehouseError::from)
            .and_then(|periods| {
                self.upsert(ctx, symbol, |connection| {
                    let updated =
                        connection.execute(SET_PERIODS, params![periods, symbol.as_str()])?;
                    if updated == 0 {
                        connection.execute(
                            INSERT_TICKER,
                            params![symbol.as_str(), ticker.company(), periods],
                        )?;
                    }
                    Ok(())
                })
            });
        settle_write("upsert_periods", symbol, result)
    }

    /// Set only the company name, creating an empty document when the
    /// symbol is absent, and return the post-image.
    pub fn update_company_name(
        &self,
        ctx: &CallContext,
        symbol: &Symbol,
        company: &str,
    ) -> Diagnosed<Option<Ticker>, WarehouseError> {
        let result = self.upsert(ctx, symbol, |connection| {
            let updated = connection.execute(SET_COMPANY, params![company, symbol.as_str()])?;
            if updated == 0 {
                connection.execute(INSERT_TICKER, params![symbol.as_str(), company, "[]"])?;
            }
            Ok(())
        });
        settle_write("update_company_name", symbol, result)
    }

    /// Look up one ticker.
    ///
    /// When the symbol is missing the value is an empty ticker for that
    /// symbol; when the stored periods cannot be decoded the value keeps the
    /// stored symbol and company without periods.
    pub fn find_one(
        &self,
        ctx: &CallContext,
        symbol: &Symbol,
    ) -> Diagnosed<Ticker, WarehouseError> {
        let stored = self.read(ctx, |connection| {
            if !collection_exists(connection)? {
                return Ok(None);
            }
            Ok(select_ticker(connection, symbol)?)
        });

        match stored {
            Ok(Some(stored)) => decode_partial(stored, symbol),
            Ok(None) => degrade(
                "find_one",
                Ticker::new(symbol.clone()),
                WarehouseError::TickerNotFound {
                    symbol: symbol.clone(),
                },
            ),
            Err(error) => degrade("find_one", Ticker::new(symbol.clone()), error),
        }
    }

    /// Distinct stored symbols, in no particular order.
    pub fn find_symbols(&self, ctx: &CallContext) -> Diagnosed<Vec<Symbol>, WarehouseError> {
        let raw = self.read(ctx, |connection| {
            if !collection_exists(connection)? {
                return Ok(Vec::new());
            }
            let mut statement = connection.prepare("SELECT DISTINCT symbol FROM tickers")?;
            let rows = statement.query_map([], |row| row.get::<_, String>(0))?;
            let mut symbols = Vec::new();
            for row in rows {
                symbols.push(row?);
            }
            Ok(symbols)
        });

        let raw = match raw {
            Ok(raw) => raw,
            Err(error) => return degrade("find_symbols", Vec::new(), error),
        };

        let mut symbols = Vec::with_capacity(raw.len());
        let mut invalid = Vec::new();
        for value in raw {
            match Symbol::parse(&value) {
                Ok(symbol) => symbols.push(symbol),
                Err(error) => invalid.push(WarehouseError::from(error)),
            }
        }
        with_diagnostics("find_symbols", symbols, invalid)
    }

    /// `{symbol, company}` for every document, sorted by symbol.
    pub fn find_symbols_and_company(
        &self,
        ctx: &CallContext,
    ) -> Diagnosed<Vec<TickerSymbolCompany>, WarehouseError> {
        let raw = self.read(ctx, |connection| {
            if !collection_exists(connection)? {
                return Ok(Vec::new());
            }
            let mut statement = connection.prepare("SELECT symbol, company FROM tickers")?;
            let rows = statement.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })?;
            let mut listing = Vec::new();
            for row in rows {
                listing.push(row?);
            }
            Ok(listing)
        });

        let raw = match raw {
            Ok(raw) => raw,
            Err(error) => return degrade("find_symbols_and_company", Vec::new(), error),
        };

        let mut listing = Vec::with_capacity(raw.len());
        let mut invalid = Vec::new();
        for (symbol, company) in raw {
            match Symbol::parse(&symbol) {
                Ok(symbol) => listing.push(TickerSymbolCompany::new(symbol, company)),
                Err(error) => invalid.push(WarehouseError::from(error)),
            }
        }
        listing.sort();
        with_diagnostics("find_symbols_and_company", listing, invalid)
    }

    /// Number of stored documents; zero when the collection is absent.
    ///
    /// # Errors
    /// Returns the storage error, or the context error.
    pub fn document_count(&self, ctx: &CallContext) -> Result<usize, WarehouseError> {
        self.read(ctx, |connection| {
            if !collection_exists(connection)? {
                return Ok(0);
            }
            let count: i64 =
                connection.query_row("SELECT COUNT(*) FROM tickers", [], |row| row.get(0))?;
            Ok(usize::try_from(count).unwrap_or_default())
        })
    }

    fn with_connection<T>(
        &self,
        work: impl FnOnce(&Connection) -> Result<T, WarehouseError>,
    ) -> Result<T, WarehouseError> {
        self.manager.with_connection(work)
    }

    fn read<T>(
        &self,
        ctx: &CallContext,
        query: impl FnOnce(&Connection) -> Result<T, WarehouseError>,
    ) -> Result<T, WarehouseError> {
        ctx.check()?;
        self.with_connection(query)
    }

    /// Compare-and-swap on the symbol index: run `write` and read the
    /// post-image in one transaction, retrying when a concurrent writer wins.
    fn upsert(
        &self,
        ctx: &CallContext,
        symbol: &Symbol,
        write: impl Fn(&Connection) -> Result<(), WarehouseError>,
    ) -> Result<Ticker, WarehouseError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            ctx.check()?;
            let result = self.with_connection(|connection| {
                ensure_collection(connection)?;
                in_transaction(connection, ctx, |connection| {
                    write(connection)?;
                    select_ticker(connection, symbol)?
                        .ok_or_else(|| WarehouseError::TickerNotFound {
                            symbol: symbol.clone(),
                        })?
                        .into_ticker()
                })
            });

            match result {
                Err(error) if is_write_conflict(&error) => {
                    if attempts >= MAX_UPSERT_ATTEMPTS {
                        return Err(WarehouseError::UpsertConflict {
                            symbol: symbol.clone(),
                            attempts,
                        });
                    }
                    debug!(%symbol, attempts, %error, "retrying upsert after write conflict");
                }
                other => return other,
            }
        }
    }
}

fn select_ticker(
    connection: &Connection,
    symbol: &Symbol,
) -> Result<Option<StoredTicker>, ::duckdb::Error> {
    connection
        .query_row(SELECT_TICKER, [symbol.as_str()], StoredTicker::from_row)
        .optional()
}

/// Run `work` inside a transaction, checking the context before commit.
fn in_transaction<T>(
    connection: &Connection,
    ctx: &CallContext,
    work: impl FnOnce(&Connection) -> Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    connection.execute_batch("BEGIN TRANSACTION")?;
    let result = work(connection).and_then(|value| ctx.check().map(|()| value));
    finalize_transaction(connection, result)
}

fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => match connection.execute_batch("COMMIT") {
            Ok(()) => Ok(value),
            Err(error) => {
                let _ = connection.execute_batch("ROLLBACK");
                Err(error.into())
            }
        },
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

fn is_write_conflict(error: &WarehouseError) -> bool {
    match error {
        WarehouseError::DuckDb(error) => {
            let message = error.to_string();
            message.contains("Constraint Error") || message.contains("onflict")
        }
        _ => false,
    }
}

fn decode_partial(
    stored: StoredTicker,
    requested: &Symbol,
) -> Diagnosed<Ticker, WarehouseError> {
    let symbol = match Symbol::parse(&stored.symbol) {
        Ok(symbol) => symbol,
        Err(error) => return degrade("find_one", Ticker::new(requested.clone()), error.into()),
    };
    match serde_json::from_str::<Vec<Period>>(&stored.periods) {
        Ok(periods) => Diagnosed::clean(Ticker::from_parts(symbol, stored.company, periods)),
        Err(error) => degrade(
            "find_one",
            Ticker::from_parts(symbol, stored.company, Vec::new()),
            error.into(),
        ),
    }
}

fn settle_write(
    operation: &'static str,
    symbol: &Symbol,
    result: Result<Ticker, WarehouseError>,
) -> Diagnosed<Option<Ticker>, WarehouseError> {
    match result {
        Ok(ticker) => {
            debug!(operation, %symbol, periods = ticker.periods().len(), "stored ticker");
            Diagnosed::clean(Some(ticker))
        }
        Err(error) => {
            warn!(operation, %symbol, %error, "ticker write failed");
            Diagnosed::with_diagnostic(None, error)
        }
    }
}

fn degrade<T>(
    operation: &'static str,
    value: T,
    error: WarehouseError,
) -> Diagnosed<T, WarehouseError> {
    warn!(operation, %error, "storage call degraded");
    Diagnosed::with_diagnostic(value, error)
}

fn with_diagnostics<T>(
    operation: &'static str,
    value: T,
    errors: Vec<WarehouseError>,
) -> Diagnosed<T, WarehouseError> {
    let mut result = Diagnosed::clean(value);
    for error in errors {
        warn!(operation, %error, "skipped stored document");
        result.push(error);
    }
    result
}
