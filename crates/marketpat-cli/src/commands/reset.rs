use serde_json::json;

use crate::error::CliError;

use super::{CommandResult, Session};

pub async fn run(session: &Session) -> Result<CommandResult, CliError> {
    session
        .blocking(|session| session.repository().delete_all(&session.context()))
        .await??;
    Ok(CommandResult::ok(json!({ "dropped": true })))
}
