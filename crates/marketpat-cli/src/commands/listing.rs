use serde::Serialize;

use crate::error::CliError;

use super::{CommandResult, Session};

pub async fn symbols(session: &Session) -> Result<CommandResult, CliError> {
    let found = session
        .blocking(|session| session.repository().find_symbols(&session.context()))
        .await?;
    CommandResult::from_diagnosed("find_symbols", found)
}

pub async fn companies(session: &Session) -> Result<CommandResult, CliError> {
    let listing = session
        .blocking(|session| session.repository().find_symbols_and_company(&session.context()))
        .await?;
    CommandResult::from_diagnosed("find_symbols_and_company", listing)
}

#[derive(Debug, Serialize)]
struct TickerNames {
    names: Vec<String>,
}

/// Sorted names of every stored ticker.
pub async fn names(session: &Session) -> Result<CommandResult, CliError> {
    let found = session
        .blocking(|session| session.repository().find_symbols(&session.context()))
        .await?;
    let names = found.map(|symbols| {
        let mut names: Vec<String> = symbols.into_iter().map(String::from).collect();
        names.sort();
        TickerNames { names }
    });
    CommandResult::from_diagnosed("find_symbols", names)
}
