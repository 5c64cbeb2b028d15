use marketpat_core::Symbol;

use crate::cli::ShowArgs;
use crate::error::CliError;

use super::{CommandResult, Session};

pub async fn run(args: &ShowArgs, session: &Session) -> Result<CommandResult, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;
    let found = session
        .blocking(move |session| session.repository().find_one(&session.context(), &symbol))
        .await?;
    CommandResult::from_diagnosed("find_one", found)
}
