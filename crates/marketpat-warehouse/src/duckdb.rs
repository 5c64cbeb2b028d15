//! `DuckDB` connection management.
//!
//! The database is opened once; every pooled connection is cloned from that
//! root handle so all of them see the same database instance, including an
//! in-memory one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ::duckdb::Connection;
use parking_lot::Mutex;

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    InMemory,
}

struct PoolInner {
    location: DbLocation,
    max_pool_size: usize,
    root: Mutex<Connection>,
    idle: Mutex<Vec<Connection>>,
}

/// A small pool of `DuckDB` connections sharing one database instance.
#[derive(Clone)]
pub struct DuckDbConnectionManager {
    inner: Arc<PoolInner>,
}

impl DuckDbConnectionManager {
    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the database file cannot be opened or configured.
    pub fn open(path: impl Into<PathBuf>, max_pool_size: usize) -> Result<Self, ::duckdb::Error> {
        let path = path.into();
        let root = Connection::open(&path)?;
        Self::from_root(root, DbLocation::File(path), max_pool_size)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns an error if `DuckDB` fails to allocate the database.
    pub fn open_in_memory(max_pool_size: usize) -> Result<Self, ::duckdb::Error> {
        let root = Connection::open_in_memory()?;
        Self::from_root(root, DbLocation::InMemory, max_pool_size)
    }

    fn from_root(
        root: Connection,
        location: DbLocation,
        max_pool_size: usize,
    ) -> Result<Self, ::duckdb::Error> {
        configure_connection(&root)?;
        Ok(Self {
            inner: Arc::new(PoolInner {
                location,
                max_pool_size: max_pool_size.max(1),
                root: Mutex::new(root),
                idle: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Run `work` on a pooled connection. The connection goes back to the
    /// pool afterwards unless the pool is already full.
    ///
    /// # Errors
    /// Returns the error of `work`, or a `DuckDB` error if no connection
    /// could be opened.
    pub fn with_connection<T, E>(
        &self,
        work: impl FnOnce(&Connection) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<::duckdb::Error>,
    {
        let connection = self.checkout()?;
        let result = work(&connection);
        self.checkin(connection);
        result
    }

    fn checkout(&self) -> Result<Connection, ::duckdb::Error> {
        if let Some(connection) = self.inner.idle.lock().pop() {
            return Ok(connection);
        }
        let connection = self.inner.root.lock().try_clone()?;
        configure_connection(&connection)?;
        Ok(connection)
    }

    fn checkin(&self, connection: Connection) {
        let mut idle = self.inner.idle.lock();
        if idle.len() < self.inner.max_pool_size {
            idle.push(connection);
        }
    }

    pub fn location(&self) -> &DbLocation {
        &self.inner.location
    }

    /// Path to the database file, `None` for in-memory databases.
    pub fn db_path(&self) -> Option<&Path> {
        match &self.inner.location {
            DbLocation::File(path) => Some(path.as_path()),
            DbLocation::InMemory => None,
        }
    }

    /// Number of idle connections currently held.
    pub fn idle_connections(&self) -> usize {
        self.inner.idle.lock().len()
    }
}

fn configure_connection(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch("PRAGMA disable_progress_bar;")
}
