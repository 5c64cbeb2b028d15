use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{Period, Symbol};

/// An instrument's identity and its ingested price history.
///
/// `periods` keeps ingestion order; nothing here sorts or deduplicates by
/// date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    symbol: Symbol,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    company: Option<String>,
    #[serde(default)]
    periods: Vec<Period>,
}

impl Ticker {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            company: None,
            periods: Vec::new(),
        }
    }

    pub fn with_company(symbol: Symbol, company: impl Into<String>) -> Self {
        Self {
            symbol,
            company: Some(company.into()),
            periods: Vec::new(),
        }
    }

    /// Rebuild an aggregate from stored parts.
    pub fn from_parts(symbol: Symbol, company: Option<String>, periods: Vec<Period>) -> Self {
        Self {
            symbol,
            company,
            periods,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn company(&self) -> Option<&str> {
        self.company.as_deref()
    }

    pub fn set_company(&mut self, company: impl Into<String>) {
        self.company = Some(company.into());
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub(crate) fn push_period(&mut self, period: Period) {
        self.periods.push(period);
    }

    /// Symbol and company name only.
    pub fn to_symbol_company(&self) -> TickerSymbolCompany {
        TickerSymbolCompany {
            symbol: self.symbol.clone(),
            company: self.company.clone(),
        }
    }
}

/// Listing projection of a stored ticker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickerSymbolCompany {
    pub symbol: Symbol,
    #[serde(default)]
    pub company: Option<String>,
}

impl TickerSymbolCompany {
    pub fn new(symbol: Symbol, company: Option<String>) -> Self {
        Self { symbol, company }
    }
}

impl Ord for TickerSymbolCompany {
    fn cmp(&self, other: &Self) -> Ordering {
        self.symbol
            .cmp(&other.symbol)
            .then_with(|| self.company.cmp(&other.company))
    }
}

impl PartialOrd for TickerSymbolCompany {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
