//! Ingest CSV files into a fresh registry, then store the tickers.

use std::sync::Arc;

use marketpat_core::{symbol_from_path, IngestReport, Ingestor, Ticker, TickerRegistry};
use marketpat_warehouse::WarehouseError;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, info_span, Instrument, Span};
use uuid::Uuid;

use crate::cli::LoadArgs;
use crate::error::CliError;

use super::{CommandResult, Session};

pub async fn run(args: &LoadArgs, session: &Session) -> Result<CommandResult, CliError> {
    let run_id = Uuid::new_v4();
    let span = info_span!("load", %run_id, files = args.files.len(), reload = args.reload);
    load(args, session, run_id).instrument(span).await
}

async fn load(args: &LoadArgs, session: &Session, run_id: Uuid) -> Result<CommandResult, CliError> {
    let registry = Arc::new(TickerRegistry::new());
    let ingestor = Ingestor::new(Arc::clone(&registry));

    let mut tasks = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let symbol = symbol_from_path(path)?;
        let ingestor = ingestor.clone();
        let path = path.clone();
        let span = Span::current();
        tasks.push(tokio::task::spawn_blocking(move || {
            span.in_scope(|| ingestor.ingest_path(&symbol, &path))
        }));
    }

    let mut files = Vec::with_capacity(tasks.len());
    for task in tasks {
        files.push(task.await??);
    }

    let mut result = CommandResult::ok(Value::Null);
    for report in &files {
        if !report.diagnostics.is_empty() {
            result = result.with_warning(format!(
                "{}: {} row(s) had unparseable fields",
                report.symbol,
                report.diagnostics.len()
            ));
        }
    }

    let tickers = registry.snapshot_all();
    let ticker_count = tickers.len();
    let stored = if args.reload {
        reload(session, tickers).await?
    } else {
        let (stored, warnings) = refresh(session, tickers).await?;
        result = result.with_warnings(warnings);
        stored
    };

    info!(tickers = ticker_count, stored, "load finished");

    result.data = serde_json::to_value(LoadResponse {
        run_id,
        reload: args.reload,
        files,
        stored,
    })?;
    Ok(result)
}

/// Replace the whole collection; any failure aborts the load.
async fn reload(session: &Session, tickers: Vec<Ticker>) -> Result<usize, CliError> {
    let count = tickers.len();
    session
        .blocking(move |session| -> Result<(), WarehouseError> {
            let repository = session.repository();
            repository.delete_all(&session.context())?;
            repository.init(&session.context());
            repository.insert_many(&session.context(), &tickers)
        })
        .await??;
    Ok(count)
}

/// Replace each symbol's periods, keeping stored company names. A failed
/// symbol becomes a warning.
async fn refresh(
    session: &Session,
    tickers: Vec<Ticker>,
) -> Result<(usize, Vec<String>), CliError> {
    session
        .blocking(move |session| {
            let mut stored = 0;
            let mut warnings = Vec::new();
            for ticker in &tickers {
                let outcome = session.repository().upsert_periods(&session.context(), ticker);
                if outcome.value().is_some() {
                    stored += 1;
                }
                for diagnostic in outcome.diagnostics() {
                    warnings.push(format!("upsert_periods {}: {diagnostic}", ticker.symbol()));
                }
            }
            (stored, warnings)
        })
        .await
}

#[derive(Debug, Serialize)]
struct LoadResponse {
    run_id: Uuid,
    reload: bool,
    files: Vec<IngestReport>,
    stored: usize,
}
