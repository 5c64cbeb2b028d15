//! Storage layout of the ticker collection.
//!
//! Each ticker is one row: the `symbol` key, the optional `company`, and the
//! period history as a JSON array. `idx_symbol` enforces one document per
//! symbol and every upsert path relies on it.

use ::duckdb::Connection;

pub(crate) const COLLECTION: &str = "tickers";
pub(crate) const SYMBOL_INDEX: &str = "idx_symbol";

const CREATE_COLLECTION: &str = r#"
CREATE TABLE IF NOT EXISTS tickers (
    symbol VARCHAR NOT NULL,
    company VARCHAR,
    periods VARCHAR NOT NULL DEFAULT '[]',
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#;

const CREATE_SYMBOL_INDEX: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_symbol ON tickers(symbol);";

/// Create the collection and its unique symbol index if either is missing.
pub(crate) fn ensure_collection(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(CREATE_COLLECTION)?;
    connection.execute_batch(CREATE_SYMBOL_INDEX)?;
    Ok(())
}

/// Whether the collection currently exists (it does not after a drop).
pub(crate) fn collection_exists(connection: &Connection) -> Result<bool, ::duckdb::Error> {
    let count: i64 = connection.query_row(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
        [COLLECTION],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub(crate) fn drop_collection(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch("DROP TABLE IF EXISTS tickers;")
}

#[cfg(test)]
pub(crate) fn index_exists(connection: &Connection) -> Result<bool, ::duckdb::Error> {
    let count: i64 = connection.query_row(
        "SELECT COUNT(*) FROM duckdb_indexes() WHERE index_name = ? AND is_unique",
        [SYMBOL_INDEX],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_collection_is_idempotent() {
        let connection = Connection::open_in_memory().expect("open");
        assert!(!collection_exists(&connection).expect("exists"));

        ensure_collection(&connection).expect("first");
        ensure_collection(&connection).expect("second");

        assert!(collection_exists(&connection).expect("exists"));
        assert!(index_exists(&connection).expect("index"));
    }

    #[test]
    fn unique_index_rejects_second_document_for_symbol() {
        let connection = Connection::open_in_memory().expect("open");
        ensure_collection(&connection).expect("collection");

        connection
            .execute("INSERT INTO tickers (symbol) VALUES (?)", ["AAA"])
            .expect("first insert");
        let duplicate = connection.execute("INSERT INTO tickers (symbol) VALUES (?)", ["AAA"]);
        assert!(duplicate.is_err());
    }

    #[test]
    fn drop_removes_collection() {
        let connection = Connection::open_in_memory().expect("open");
        ensure_collection(&connection).expect("collection");
        drop_collection(&connection).expect("drop");
        assert!(!collection_exists(&connection).expect("exists"));
    }
}
