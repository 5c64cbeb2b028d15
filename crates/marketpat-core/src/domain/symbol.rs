use std::fmt::{Display, Formatter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Longest accepted symbol, in characters. Room for exchange-qualified
/// tickers such as `SHOP.TO` or `VOD.L` plus a share class, while keeping
/// price file names short.
const MAX_SYMBOL_LEN: usize = 15;

/// Canonical ticker symbol: trimmed and upper-cased.
///
/// Symbols usually come from price file names (`ibm.csv` -> `IBM`), so the
/// accepted alphabet is what a file stem can carry portably: ASCII letters
/// and digits, plus `.` and `-` for share classes (`BRK.B`, `RDS-A`). The
/// first character must be a letter.
///
/// This is the only key shared between the in-memory registry and the
/// stored collection, so every lookup goes through [`Symbol::parse`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Parse and normalize a symbol to uppercase.
    ///
    /// # Errors
    /// Returns the first rule the input breaks, scanning left to right;
    /// emptiness and length are checked after the characters.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_uppercase();

        let mut len = 0;
        for (index, ch) in normalized.chars().enumerate() {
            if index == 0 && !ch.is_ascii_alphabetic() {
                return Err(ValidationError::SymbolInvalidStart { ch });
            }
            if !is_symbol_char(ch) {
                return Err(ValidationError::SymbolInvalidChar { ch, index });
            }
            len = index + 1;
        }

        match len {
            0 => Err(ValidationError::EmptySymbol),
            len if len > MAX_SYMBOL_LEN => Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_SYMBOL_LEN,
            }),
            _ => Ok(Self(normalized)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Derive a symbol from a price file name, e.g. `data/ibm.csv` -> `IBM`.
pub fn symbol_from_path(path: &Path) -> Result<Symbol, ValidationError> {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| ValidationError::SymbolFromPath {
            path: path.display().to_string(),
        })?;
    Symbol::parse(stem)
}

fn is_symbol_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '.' || ch == '-'
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}
