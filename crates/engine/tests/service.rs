use analytics::{Metric, MetricsEngine, UndefinedReason};
use chrono::NaiveDate;
use core_types::{Owner, RawRow};
use database::{CsvLedgerStore, InMemoryLedgerStore, LedgerStore};
use engine::LedgerService;
use ledger::DateParser;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tempfile::tempdir;

fn service(store: Arc<dyn LedgerStore>) -> LedgerService {
    LedgerService::new(store, MetricsEngine::default(), DateParser::default())
}

fn owner(name: &str) -> Owner {
    Owner::new(name).unwrap()
}

fn shared_store() -> Vec<RawRow> {
    vec![
        RawRow::new("alice", "2023-01-01", "-3000"),
        RawRow::new("bob", "2023-03-01", "-500"),
        RawRow::new("alice", "01/01/2024", "3,600"),
        RawRow::new("alice", "someday", "-1"),
    ]
}

#[test]
fn report_uses_only_the_owners_valid_rows() {
    let service = service(Arc::new(InMemoryLedgerStore::with_rows(shared_store())));
    let result = service.report(&owner("alice")).unwrap();

    assert_eq!(result.rejected_rows, 1);
    assert_eq!(result.report.invested, dec!(3000));
    assert_eq!(result.report.net_value, dec!(3600));
    assert_eq!(result.report.profit, dec!(600));
    assert!((result.report.xirr.value() - 0.20).abs() < 1e-4);
}

#[test]
fn report_for_unknown_owner_is_empty() {
    let service = service(Arc::new(InMemoryLedgerStore::with_rows(shared_store())));
    let result = service.report(&owner("dave")).unwrap();

    assert_eq!(result.report.record_count, 0);
    assert_eq!(
        result.report.xirr,
        Metric::Undefined(UndefinedReason::TooFewRecords)
    );
}

#[test]
fn owners_are_listed_with_counts() {
    let service = service(Arc::new(InMemoryLedgerStore::with_rows(shared_store())));
    let owners = service.owners().unwrap();
    assert_eq!(owners, vec![(owner("alice"), 2), (owner("bob"), 1)]);
}

#[test]
fn append_then_report() {
    let service = service(Arc::new(InMemoryLedgerStore::new()));
    let alice = owner("alice");
    service
        .append(&alice, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), dec!(-1000))
        .unwrap();
    service
        .append(&alice, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), dec!(1100))
        .unwrap();

    let report = service.report(&alice).unwrap().report;
    assert_eq!(report.record_count, 2);
    assert!((report.xirr.value() - 0.10).abs() < 1e-4);
}

#[test]
fn replace_keeps_other_owners_and_drops_deleted_rows() {
    let store = Arc::new(InMemoryLedgerStore::with_rows(shared_store()));
    let service = service(store.clone());
    let alice = owner("alice");

    let session = service.rows(&alice).unwrap();
    assert_eq!(session.rows.len(), 3);

    service
        .replace(
            &alice,
            vec![RawRow::new("alice", "2023-01-01", "-3000")],
            Some(session.revision),
        )
        .unwrap();

    let rows = store.load(None).unwrap().rows;
    assert_eq!(
        rows,
        vec![
            RawRow::new("bob", "2023-03-01", "-500"),
            RawRow::new("alice", "2023-01-01", "-3000"),
        ]
    );
}

#[test]
fn stale_session_is_refused() {
    let service = service(Arc::new(InMemoryLedgerStore::with_rows(shared_store())));
    let alice = owner("alice");

    // Two sessions open the same ledger; the first one saves.
    let first = service.rows(&alice).unwrap();
    let second = service.rows(&alice).unwrap();
    service
        .replace(&alice, first.rows.clone(), Some(first.revision))
        .unwrap();

    let err = service
        .replace(&alice, Vec::new(), Some(second.revision))
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(service.rows(&alice).unwrap().rows.len(), 3);
}

#[test]
fn csv_backed_service_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cashflows.csv");
    let service = service(Arc::new(CsvLedgerStore::new(&path)));
    let alice = owner("alice");

    service
        .replace(
            &alice,
            vec![
                RawRow::new("", "2023-01-01", "-3000"),
                RawRow::new("", "2024-01-01", "3600"),
            ],
            None,
        )
        .unwrap();
    service
        .append(&owner("bob"), NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(), dec!(-10))
        .unwrap();

    let result = service.report(&alice).unwrap();
    assert_eq!(result.report.profit, dec!(600));
    assert!((result.report.cagr.value() - 0.20).abs() < 1e-9);

    // Re-saving an unedited session leaves the file's rows unchanged.
    let before = service.rows(&alice).unwrap();
    service
        .replace(&alice, before.rows.clone(), Some(before.revision))
        .unwrap();
    assert_eq!(service.rows(&alice).unwrap().rows, before.rows);
}

#[test]
fn a_short_csv_row_only_affects_its_own_owner() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cashflows.csv");
    std::fs::write(
        &path,
        "owner,date,amount\nalice,2023-01-01,-3000\nalice,2024-01-01,3600\nbob,2024-02-01\n",
    )
    .unwrap();
    let service = service(Arc::new(CsvLedgerStore::new(&path)));

    let alice = service.report(&owner("alice")).unwrap();
    assert_eq!(alice.report.invested, dec!(3000));
    assert_eq!(alice.report.profit, dec!(600));

    let bob = service.report(&owner("bob")).unwrap();
    assert_eq!(bob.rejected_rows, 1);
    assert_eq!(bob.report.record_count, 0);

    // The incomplete row survives an append by someone else.
    service
        .append(&owner("carol"), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), dec!(-1))
        .unwrap();
    assert_eq!(
        service.rows(&owner("bob")).unwrap().rows,
        vec![RawRow::new("bob", "2024-02-01", "")]
    );
}
