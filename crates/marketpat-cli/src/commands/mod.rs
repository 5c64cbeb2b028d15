mod listing;
mod load;
mod reset;
mod set_company;
mod show;

use std::fmt::Display;
use std::time::Duration;

use marketpat_core::Diagnosed;
use marketpat_warehouse::{CallContext, TickerRepository, WarehouseConfig};
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    /// Serialize a degraded value, turning its diagnostics into warnings.
    pub fn from_diagnosed<T, D>(
        operation: &str,
        diagnosed: Diagnosed<T, D>,
    ) -> Result<Self, CliError>
    where
        T: Serialize,
        D: Display,
    {
        let (value, diagnostics) = diagnosed.into_parts();
        let warnings = diagnostics
            .iter()
            .map(|diagnostic| format!("{operation}: {diagnostic}"))
            .collect();
        Ok(Self::ok(serde_json::to_value(value)?).with_warnings(warnings))
    }
}

/// Repository handle plus the per-call deadline and shutdown signal.
#[derive(Clone)]
pub struct Session {
    repository: TickerRepository,
    timeout: Duration,
    shutdown: CancellationToken,
}

impl Session {
    fn open(cli: &Cli) -> Result<Self, CliError> {
        let mut config = WarehouseConfig::default();
        if let Some(db) = &cli.db {
            config = config.with_db_path(db);
        }
        let repository = TickerRepository::open(&config)?;
        let session = Self {
            repository,
            timeout: cli.timeout(),
            shutdown: CancellationToken::new(),
        };
        session.repository.init(&session.context());
        Ok(session)
    }

    pub fn repository(&self) -> &TickerRepository {
        &self.repository
    }

    /// Fresh context for one storage call.
    pub fn context(&self) -> CallContext {
        CallContext::with_timeout(self.timeout).with_cancellation(self.shutdown.child_token())
    }

    /// Run blocking storage work off the async runtime.
    pub async fn blocking<T>(
        &self,
        work: impl FnOnce(&Session) -> T + Send + 'static,
    ) -> Result<T, CliError>
    where
        T: Send + 'static,
    {
        let session = self.clone();
        Ok(tokio::task::spawn_blocking(move || work(&session)).await?)
    }

    fn cancel_on_ctrl_c(&self) -> JoinHandle<()> {
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling storage calls");
                shutdown.cancel();
            }
        })
    }
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    let session = Session::open(cli)?;
    let watcher = session.cancel_on_ctrl_c();

    let result = match &cli.command {
        Command::Load(args) => load::run(args, &session).await,
        Command::Symbols => listing::symbols(&session).await,
        Command::Companies => listing::companies(&session).await,
        Command::Names => listing::names(&session).await,
        Command::Show(args) => show::run(args, &session).await,
        Command::SetCompany(args) => set_company::run(args, &session).await,
        Command::Reset => reset::run(&session).await,
    };

    watcher.abort();
    result
}
