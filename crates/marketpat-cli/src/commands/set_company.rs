use marketpat_core::Symbol;

use crate::cli::SetCompanyArgs;
use crate::error::CliError;

use super::{CommandResult, Session};

/// Prints the updated ticker, or `null` when the update did not happen.
pub async fn run(args: &SetCompanyArgs, session: &Session) -> Result<CommandResult, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;
    let company = args.company.trim().to_owned();
    if company.is_empty() {
        return Err(CliError::Command(String::from("company name must not be empty")));
    }

    let updated = session
        .blocking(move |session| {
            session
                .repository()
                .update_company_name(&session.context(), &symbol, &company)
        })
        .await?;
    CommandResult::from_diagnosed("update_company_name", updated)
}
