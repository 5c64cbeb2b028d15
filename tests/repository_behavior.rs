//! Behavior-driven tests for the ticker repository
//!
//! These tests verify what callers observe from the stored collection:
//! which writes are hard failures, which reads degrade, and how the unique
//! symbol index shapes every upsert.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use marketpat_tests::*;
use proptest::prelude::*;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

// =============================================================================
// Repository: Bulk Writes and Listings
// =============================================================================

#[test]
fn when_tickers_are_bulk_inserted_listings_show_them_sorted() {
    // Given: An initialized, empty repository
    let repository = open_repository();

    // When: BBB and AAA are inserted in one batch, out of order
    repository
        .insert_many(&background(), &[ticker("BBB", "Beta"), ticker("AAA", "Acme")])
        .expect("insert should succeed");

    // Then: The distinct symbols are exactly AAA and BBB
    let symbols = repository.find_symbols(&background());
    assert!(symbols.is_clean());
    let found: HashSet<&str> = symbols.value().iter().map(Symbol::as_str).collect();
    assert_eq!(found, HashSet::from(["AAA", "BBB"]));

    // And: The projection is sorted by symbol
    let listing = repository.find_symbols_and_company(&background());
    assert!(listing.is_clean());
    assert_eq!(
        listing.value(),
        &vec![
            TickerSymbolCompany::new(symbol("AAA"), Some(String::from("Acme"))),
            TickerSymbolCompany::new(symbol("BBB"), Some(String::from("Beta"))),
        ]
    );
}

#[test]
fn when_bulk_insert_hits_an_existing_symbol_nothing_is_stored() {
    // Given: AAA already stored
    let repository = open_repository();
    repository
        .insert_many(&background(), &[ticker("AAA", "Acme")])
        .expect("first insert");

    // When: A batch containing a new symbol and AAA again is inserted
    let batch = [ticker("CCC", "Gamma"), ticker("AAA", "Other")];
    let result = repository.insert_many(&background(), &batch);

    // Then: The batch fails as a whole
    assert!(matches!(result, Err(WarehouseError::DuckDb(_))));
    assert_eq!(repository.document_count(&background()).expect("count"), 1);
    let existing = repository.find_one(&background(), &symbol("AAA"));
    assert_eq!(existing.value().company(), Some("Acme"));
}

#[test]
fn empty_bulk_insert_is_a_no_op() {
    let repository = TickerRepository::open_in_memory().expect("repository open");

    repository.insert_many(&background(), &[]).expect("empty insert");

    assert_eq!(repository.document_count(&background()).expect("count"), 0);
}

// =============================================================================
// Repository: Upserts
// =============================================================================

#[test]
fn when_the_same_symbol_is_upserted_twice_one_document_keeps_the_latest_company() {
    // Given: An empty repository
    let repository = open_repository();

    // When: AAA is upserted twice with different companies
    let first = repository.upsert_replace(&background(), &ticker("AAA", "Acme"));
    let second = repository.upsert_replace(&background(), &ticker("AAA", "Acme Holdings"));

    // Then: Each call returns its own post-image
    assert_eq!(first.value().as_ref().and_then(Ticker::company), Some("Acme"));
    assert_eq!(second.value().as_ref().and_then(Ticker::company), Some("Acme Holdings"));

    // And: Exactly one document is stored, with the latest company
    assert_eq!(repository.document_count(&background()).expect("count"), 1);
    let stored = repository.find_one(&background(), &symbol("AAA"));
    assert!(stored.is_clean());
    assert_eq!(stored.value().company(), Some("Acme Holdings"));
}

#[test]
fn upsert_replaces_the_whole_document_including_periods() {
    // Given: AAA stored with two periods
    let repository = open_repository();
    let original = Ticker::from_parts(
        symbol("AAA"),
        Some(String::from("Acme")),
        vec![
            period(["2020-01-02", "10", "12", "9", "11", "1000"]),
            period(["2020-01-03", "11", "13", "10", "12", "1500"]),
        ],
    );
    let stored = repository.upsert_replace(&background(), &original);
    assert_eq!(stored.value().as_ref(), Some(&original));

    // When: AAA is replaced by a document without company and one period
    let replacement = Ticker::from_parts(
        symbol("AAA"),
        None,
        vec![period(["2020-02-03", "20", "22", "19", "21", "3000"])],
    );
    let replaced = repository.upsert_replace(&background(), &replacement);

    // Then: Nothing of the old document survives
    assert!(replaced.is_clean());
    let found = repository.find_one(&background(), &symbol("AAA"));
    assert_eq!(found.value(), &replacement);
}

#[test]
fn sentinel_dated_periods_survive_storage() {
    let repository = open_repository();
    let ticker = Ticker::from_parts(
        symbol("X"),
        None,
        vec![period(["not-a-date", "1", "2", "0.5", "1.5", "10"])],
    );
    assert!(ticker.periods()[0].is_sentinel_dated());

    assert!(repository.upsert_replace(&background(), &ticker).value().is_some());
    let found = repository.find_one(&background(), &symbol("X"));

    assert!(found.value().periods()[0].is_sentinel_dated());
    assert_eq!(found.value(), &ticker);
}

#[test]
fn when_company_is_set_on_an_unknown_symbol_the_ticker_is_created() {
    // Given: ZZZ does not exist
    let repository = open_repository();

    // When: Its company name is set
    let updated = repository.update_company_name(&background(), &symbol("ZZZ"), "NewCo");

    // Then: The post-image is a new document named NewCo with no periods
    assert!(updated.is_clean());
    let ticker = updated.value().as_ref().expect("created ticker");
    assert_eq!(ticker.symbol().as_str(), "ZZZ");
    assert_eq!(ticker.company(), Some("NewCo"));
    assert!(ticker.periods().is_empty());
}

#[test]
fn updating_company_name_keeps_existing_periods() {
    // Given: AAA stored with one period
    let repository = open_repository();
    let original = Ticker::from_parts(
        symbol("AAA"),
        Some(String::from("Acme")),
        vec![period(["2020-01-02", "10", "12", "9", "11", "1000"])],
    );
    assert!(repository.upsert_replace(&background(), &original).value().is_some());

    // When: Only the company changes
    let updated = repository.update_company_name(&background(), &symbol("AAA"), "Acme Corp");

    // Then: The period history is untouched
    let ticker = updated.into_value().expect("updated ticker");
    assert_eq!(ticker.company(), Some("Acme Corp"));
    assert_eq!(ticker.periods(), original.periods());
}

#[test]
fn concurrent_upserts_of_one_symbol_leave_one_document() {
    // Given: A file-backed repository shared by several writers
    let temp = tempdir().expect("tempdir");
    let repository = file_repository(temp.path(), 4);
    repository.init(&background());
    let successes = AtomicUsize::new(0);

    // When: Four threads upsert the same symbol at once
    thread::scope(|scope| {
        for writer in 0..4 {
            let repository = &repository;
            let successes = &successes;
            scope.spawn(move || {
                let company = format!("Writer {writer}");
                let outcome = repository.upsert_replace(&background(), &ticker("AAA", &company));
                if outcome.value().is_some() {
                    successes.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
    });

    // Then: At least one write landed and the index kept a single document
    assert!(successes.load(Ordering::SeqCst) >= 1);
    assert_eq!(repository.document_count(&background()).expect("count"), 1);
}

#[test]
fn concurrent_upserts_of_distinct_symbols_all_land() {
    let repository = open_repository();

    thread::scope(|scope| {
        for name in ["AAA", "BBB", "CCC", "DDD"] {
            let repository = &repository;
            scope.spawn(move || {
                for _ in 0..3 {
                    let outcome = repository.upsert_replace(&background(), &ticker(name, name));
                    assert!(outcome.value().is_some());
                }
            });
        }
    });

    let listing = repository.find_symbols_and_company(&background());
    let symbols: Vec<&str> = listing.value().iter().map(|entry| entry.symbol.as_str()).collect();
    assert_eq!(symbols, ["AAA", "BBB", "CCC", "DDD"]);
}

#[test]
fn replacing_periods_keeps_the_stored_company() {
    // Given: AAA named Acme with one period
    let repository = open_repository();
    let original = Ticker::from_parts(
        symbol("AAA"),
        Some(String::from("Acme")),
        vec![period(["2020-01-02", "10", "12", "9", "11", "1000"])],
    );
    assert!(repository.upsert_replace(&background(), &original).value().is_some());

    // When: A freshly ingested aggregate without a company replaces the periods
    let ingested = Ticker::from_parts(
        symbol("AAA"),
        None,
        vec![
            period(["2020-01-02", "10", "12", "9", "11", "1000"]),
            period(["2020-01-03", "11", "13", "10", "12", "1500"]),
        ],
    );
    let refreshed = repository.upsert_periods(&background(), &ingested);

    // Then: The post-image has the new periods and the old company
    assert!(refreshed.is_clean());
    let ticker = refreshed.into_value().expect("stored ticker");
    assert_eq!(ticker.company(), Some("Acme"));
    assert_eq!(ticker.periods(), ingested.periods());
}

#[test]
fn replacing_periods_of_an_unknown_symbol_creates_it() {
    let repository = open_repository();
    let ingested = Ticker::from_parts(
        symbol("NEW"),
        None,
        vec![period(["2020-01-02", "1", "2", "0.5", "1.5", "10"])],
    );

    let created = repository.upsert_periods(&background(), &ingested);

    assert_eq!(created.value().as_ref(), Some(&ingested));
    assert_eq!(repository.document_count(&background()).expect("count"), 1);
}

// =============================================================================
// Repository: Dropping the Collection
// =============================================================================

#[test]
fn after_delete_all_reads_are_empty_and_lookups_report_not_found() {
    // Given: Two stored tickers
    let repository = open_repository();
    repository
        .insert_many(&background(), &[ticker("AAA", "Acme"), ticker("BBB", "Beta")])
        .expect("insert");

    // When: The collection is dropped
    repository.delete_all(&background()).expect("delete_all");

    // Then: Listings are clean and empty
    let symbols = repository.find_symbols(&background());
    assert!(symbols.is_clean());
    assert!(symbols.value().is_empty());
    let listing = repository.find_symbols_and_company(&background());
    assert!(listing.is_clean());
    assert!(listing.value().is_empty());

    // And: A lookup returns an empty ticker with a not-found diagnostic
    let found = repository.find_one(&background(), &symbol("AAA"));
    assert_eq!(found.value(), &Ticker::new(symbol("AAA")));
    assert!(matches!(
        found.diagnostics(),
        [WarehouseError::TickerNotFound { symbol }] if symbol.as_str() == "AAA"
    ));

    // And: Dropping again is harmless
    repository.delete_all(&background()).expect("second delete_all");
}

#[test]
fn writes_after_delete_all_recreate_the_collection_with_its_index() {
    let repository = open_repository();
    repository.delete_all(&background()).expect("delete_all");

    repository
        .insert_many(&background(), &[ticker("AAA", "Acme")])
        .expect("insert after drop");
    let duplicate = repository.insert_many(&background(), &[ticker("AAA", "Again")]);

    assert!(duplicate.is_err());
    assert_eq!(repository.document_count(&background()).expect("count"), 1);
}

#[test]
fn init_is_idempotent() {
    let repository = TickerRepository::open_in_memory().expect("repository open");

    repository.init(&background());
    repository.init(&background());

    assert_eq!(repository.document_count(&background()).expect("count"), 0);
}

// =============================================================================
// Repository: Deadlines and Cancellation
// =============================================================================

#[test]
fn expired_deadline_degrades_upserts_without_writing() {
    // Given: A context whose deadline has already passed
    let repository = open_repository();
    let expired = CallContext::with_deadline(Instant::now());

    // When: A per-symbol upsert and a company update are attempted
    let upserted = repository.upsert_replace(&expired, &ticker("AAA", "Acme"));
    let updated = repository.update_company_name(&expired, &symbol("BBB"), "Beta");

    // Then: Both return no value with a deadline diagnostic
    assert!(upserted.value().is_none());
    assert!(matches!(upserted.diagnostics(), [WarehouseError::DeadlineExceeded]));
    assert!(updated.value().is_none());
    assert!(matches!(updated.diagnostics(), [WarehouseError::DeadlineExceeded]));

    // And: Nothing was stored
    assert_eq!(repository.document_count(&background()).expect("count"), 0);
}

#[test]
fn expired_deadline_fails_bulk_writes() {
    let repository = open_repository();
    let expired = CallContext::with_deadline(Instant::now());

    let inserted = repository.insert_many(&expired, &[ticker("AAA", "Acme")]);
    let dropped = repository.delete_all(&expired);

    assert!(matches!(inserted, Err(WarehouseError::DeadlineExceeded)));
    assert!(matches!(dropped, Err(WarehouseError::DeadlineExceeded)));
    assert_eq!(repository.document_count(&background()).expect("count"), 0);
}

#[test]
fn cancelled_reads_degrade_to_empty_results() {
    // Given: A stored ticker and a cancelled context
    let repository = open_repository();
    repository
        .insert_many(&background(), &[ticker("AAA", "Acme")])
        .expect("insert");
    let token = CancellationToken::new();
    token.cancel();
    let cancelled = CallContext::background().with_cancellation(token);

    // When: Listings are requested
    let symbols = repository.find_symbols(&cancelled);
    let listing = repository.find_symbols_and_company(&cancelled);

    // Then: They are empty and say why
    assert!(symbols.value().is_empty());
    assert!(matches!(symbols.diagnostics(), [WarehouseError::Cancelled]));
    assert!(listing.value().is_empty());
    assert!(matches!(listing.diagnostics(), [WarehouseError::Cancelled]));
}

// =============================================================================
// Repository: Persistence
// =============================================================================

#[test]
fn stored_tickers_survive_reopening_the_database() {
    // Given: A ticker stored in a database file
    let temp = tempdir().expect("tempdir");
    let config = WarehouseConfig {
        home: temp.path().to_path_buf(),
        db_path: temp.path().join("nested").join("tickers.duckdb"),
        max_pool_size: 2,
    };
    let original = Ticker::from_parts(
        symbol("IBM"),
        Some(String::from("IBM")),
        vec![period(["2020-01-02", "10", "12", "9", "11", "1000"])],
    );
    {
        let repository = TickerRepository::open(&config).expect("first open");
        assert!(repository.upsert_replace(&background(), &original).value().is_some());
    }

    // When: The database is opened again
    let repository = TickerRepository::open(&config).expect("second open");

    // Then: The ticker is still there
    let found = repository.find_one(&background(), &symbol("IBM"));
    assert!(found.is_clean());
    assert_eq!(found.value(), &original);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn projection_is_sorted_for_any_insertion_order(
        names in prop::collection::hash_set("[A-Z]{1,5}", 1..12)
    ) {
        let repository = TickerRepository::open_in_memory().expect("repository open");
        for name in &names {
            let outcome = repository.upsert_replace(&background(), &ticker(name, "Co"));
            prop_assert!(outcome.value().is_some());
        }

        let listing = repository.find_symbols_and_company(&background());
        let symbols: Vec<String> = listing
            .value()
            .iter()
            .map(|entry| entry.symbol.to_string())
            .collect();

        let mut expected: Vec<String> = names.into_iter().collect();
        expected.sort();
        prop_assert_eq!(symbols, expected);
    }

    #[test]
    fn stored_prices_read_back_bit_for_bit(
        prices in prop::collection::vec(0.0_f64..1e9, 4)
    ) {
        let repository = TickerRepository::open_in_memory().expect("repository open");
        let text: Vec<String> = prices.iter().map(f64::to_string).collect();
        let stored = Ticker::from_parts(
            symbol("PX"),
            None,
            vec![period([
                "2020-01-02",
                text[0].as_str(),
                text[1].as_str(),
                text[2].as_str(),
                text[3].as_str(),
                "1",
            ])],
        );

        prop_assert!(repository.upsert_replace(&background(), &stored).value().is_some());
        let found = repository.find_one(&background(), &symbol("PX"));

        prop_assert!(found.is_clean());
        let period = &found.value().periods()[0];
        let read = [period.open(), period.high(), period.low(), period.close()];
        for (read, written) in read.iter().zip(&prices) {
            prop_assert_eq!(read.to_bits(), written.to_bits());
        }
    }
}
