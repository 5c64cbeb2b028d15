use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::{date, format_description};
use time::Date;

/// Fixed textual format of period dates, both in source rows and in stored
/// documents.
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

time::serde::format_description!(period_date, Date, "[year]-[month]-[day]");

/// One trading day's summary for one instrument.
///
/// Immutable after construction; the owning [`crate::Ticker`] only ever
/// appends whole periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Period {
    #[serde(with = "period_date")]
    date: Date,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

impl Period {
    /// Date substituted when the source date cannot be parsed.
    pub const SENTINEL_DATE: Date = date!(0001-01-01);

    pub fn new(date: Date, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn open(&self) -> f64 {
        self.open
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn close(&self) -> f64 {
        self.close
    }

    pub fn volume(&self) -> u64 {
        self.volume
    }

    /// True when the date was replaced by [`Period::SENTINEL_DATE`].
    pub fn is_sentinel_dated(&self) -> bool {
        self.date == Self::SENTINEL_DATE
    }
}
