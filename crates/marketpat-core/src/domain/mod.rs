//! # Domain Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated, upper-cased ticker symbol |
//! | [`Period`] | One day's open/high/low/close/volume |
//! | [`Ticker`] | Instrument aggregate: symbol, company, periods |
//! | [`TickerSymbolCompany`] | `{symbol, company}` listing projection |

mod period;
mod symbol;
mod ticker;

pub use period::{Period, DATE_FORMAT};
pub use symbol::{symbol_from_path, Symbol};
pub use ticker::{Ticker, TickerSymbolCompany};
