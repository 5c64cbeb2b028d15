//! In-memory ticker registry.
//!
//! One map lock guards symbol -> aggregate lookups; every aggregate carries
//! its own lock, so appends for different symbols never contend and appends
//! for the same symbol are serialized.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::{Period, Symbol, Ticker};

/// Shared handle to one registered aggregate.
pub type TickerHandle = Arc<Mutex<Ticker>>;

/// Process-wide symbol -> [`Ticker`] map, constructed once by the host and
/// shared by handle.
#[derive(Debug, Default)]
pub struct TickerRegistry {
    entries: RwLock<HashMap<Symbol, TickerHandle>>,
}

impl TickerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the aggregate for `symbol`, registering an empty one on first
    /// reference. Repeated calls return the same instance.
    pub fn find(&self, symbol: &Symbol) -> TickerHandle {
        if let Some(handle) = self.entries.read().get(symbol) {
            return Arc::clone(handle);
        }

        let mut entries = self.entries.write();
        let handle = entries.entry(symbol.clone()).or_insert_with(|| {
            debug!(%symbol, "registering ticker");
            Arc::new(Mutex::new(Ticker::new(symbol.clone())))
        });
        Arc::clone(handle)
    }

    /// Append one period. No deduplication, no sorting.
    pub fn add_period(&self, ticker: &TickerHandle, period: Period) {
        ticker.lock().push_period(period);
    }

    /// Append a batch of periods under a single lock hold so the batch stays
    /// contiguous even when another caller appends to the same symbol.
    pub fn add_periods(&self, ticker: &TickerHandle, periods: impl IntoIterator<Item = Period>) {
        let mut guard = ticker.lock();
        for period in periods {
            guard.push_period(period);
        }
    }

    pub fn set_company(&self, ticker: &TickerHandle, company: impl Into<String>) {
        ticker.lock().set_company(company);
    }

    /// Copy of one aggregate, if registered.
    pub fn snapshot(&self, symbol: &Symbol) -> Option<Ticker> {
        let handle = self.entries.read().get(symbol).map(Arc::clone)?;
        let ticker = handle.lock().clone();
        Some(ticker)
    }

    /// Copies of every aggregate, sorted by symbol.
    pub fn snapshot_all(&self) -> Vec<Ticker> {
        let mut handles: Vec<(Symbol, TickerHandle)> = self
            .entries
            .read()
            .iter()
            .map(|(symbol, handle)| (symbol.clone(), Arc::clone(handle)))
            .collect();
        handles.sort_by(|left, right| left.0.cmp(&right.0));

        handles
            .into_iter()
            .map(|(_, handle)| handle.lock().clone())
            .collect()
    }

    /// Registered symbols, sorted.
    pub fn find_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .read()
            .keys()
            .map(|symbol| symbol.as_str().to_owned())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
