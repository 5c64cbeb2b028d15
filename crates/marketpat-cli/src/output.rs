use serde::Serialize;
use serde_json::Value;

use crate::commands::CommandResult;
use crate::error::CliError;

/// Document printed on stdout for every command.
#[derive(Debug, Serialize)]
struct Report<'a> {
    command: &'a str,
    data: &'a Value,
    warnings: &'a [String],
}

pub fn render(command: &str, result: &CommandResult, pretty: bool) -> Result<(), CliError> {
    let payload = to_payload(command, result, pretty)?;
    println!("{payload}");
    Ok(())
}

fn to_payload(command: &str, result: &CommandResult, pretty: bool) -> Result<String, CliError> {
    let report = Report {
        command,
        data: &result.data,
        warnings: &result.warnings,
    };
    let payload = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    Ok(payload)
}
