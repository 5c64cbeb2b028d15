//! Raw row -> [`Period`] conversion.
//!
//! Every field is converted independently. A field that does not convert is
//! replaced by its default (sentinel date, `0.0`, `0`) and reported; it never
//! aborts the row.

use time::Date;

use crate::domain::DATE_FORMAT;
use crate::{Diagnosed, FieldError, Period};

/// One source row: date, open, high, low, close, volume, all as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub date: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}

impl RawRow {
    /// Build a row from positional fields. Fields past the sixth are ignored.
    ///
    /// Returns `None` when fewer than six fields are present.
    pub fn from_fields<I, S>(fields: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields = fields.into_iter().map(Into::into);
        Some(Self {
            date: fields.next()?,
            open: fields.next()?,
            high: fields.next()?,
            low: fields.next()?,
            close: fields.next()?,
            volume: fields.next()?,
        })
    }
}

/// Convert one row into a [`Period`], recording each field that had to be
/// defaulted.
pub fn normalize_row(row: &RawRow) -> Diagnosed<Period, FieldError> {
    let mut errors = Vec::new();

    let date = parse_date(&row.date).unwrap_or_else(|error| {
        errors.push(error);
        Period::SENTINEL_DATE
    });
    let mut price = |field, value: &str| {
        parse_price(field, value).unwrap_or_else(|error| {
            errors.push(error);
            0.0
        })
    };
    let open = price("open", &row.open);
    let high = price("high", &row.high);
    let low = price("low", &row.low);
    let close = price("close", &row.close);
    let volume = parse_volume(&row.volume).unwrap_or_else(|error| {
        errors.push(error);
        0
    });

    let mut normalized = Diagnosed::clean(Period::new(date, open, high, low, close, volume));
    for error in errors {
        normalized.push(error);
    }
    normalized
}

fn parse_date(value: &str) -> Result<Date, FieldError> {
    let trimmed = value.trim();
    Date::parse(trimmed, DATE_FORMAT).map_err(|_| FieldError::InvalidDate {
        value: trimmed.to_owned(),
    })
}

fn parse_price(field: &'static str, value: &str) -> Result<f64, FieldError> {
    let trimmed = value.trim();
    let parsed: f64 = trimmed.parse().map_err(|_| FieldError::InvalidPrice {
        field,
        value: trimmed.to_owned(),
    })?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(FieldError::PriceOutOfRange {
            field,
            value: trimmed.to_owned(),
        });
    }
    Ok(parsed)
}

fn parse_volume(value: &str) -> Result<u64, FieldError> {
    let trimmed = value.trim();
    trimmed.parse().map_err(|_| FieldError::InvalidVolume {
        value: trimmed.to_owned(),
    })
}
