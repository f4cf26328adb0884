//! End-to-end construction → finalize → query flows over the file
//! backend.

use spoor::{SpoorError, StoreCode, TrailConstructor, TrailDb, TrailId, Uuid};

const COOKIE: &str = "12345678123456781234567812345678";

fn cookie() -> Uuid {
    Uuid::from_hex(COOKIE).unwrap()
}

fn store_path(dir: &tempfile::TempDir, name: &str) -> String {
    dir.path().join(name).to_str().unwrap().to_owned()
}

fn build_sample(path: &str) -> TrailDb {
    let mut cons = TrailConstructor::open(path, &["field1", "field2"]).unwrap();
    cons.add(cookie(), 1u64, &["a", "1"]).unwrap();
    cons.add(cookie(), 2u64, &["b", "2"]).unwrap();
    cons.add(cookie(), 3u64, &["c", "3"]).unwrap();
    cons.finalize().unwrap()
}

#[test]
fn trails_and_events() {
    let dir = tempfile::tempdir().unwrap();
    let db = build_sample(&store_path(&dir, "testtrail"));

    assert_eq!(db.num_trails(), 1);
    let events: Vec<_> = db
        .trail(TrailId(0))
        .unwrap()
        .collect::<spoor::Result<_>>()
        .unwrap();
    assert_eq!(events.len(), 3);
    for event in &events {
        assert_eq!(event.values.len(), 2);
    }
}

#[test]
fn fields_start_with_time() {
    let dir = tempfile::tempdir().unwrap();
    let db = build_sample(&store_path(&dir, "testtrail"));
    assert_eq!(db.fields(), &["time", "field1", "field2"]);
}

#[test]
fn suffixed_and_bare_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir, "testtrail");
    build_sample(&path);

    assert!(dir.path().join("testtrail.sdb").exists());
    assert!(!dir.path().join("testtrail").exists());

    let db1 = TrailDb::open(&format!("{path}.sdb")).unwrap();
    let db2 = TrailDb::open(&path).unwrap();
    assert_eq!(db1.num_events(), db2.num_events());

    let err = TrailDb::open(&store_path(&dir, "foo")).unwrap_err();
    assert!(matches!(
        err,
        SpoorError::Open {
            code: StoreCode::Missing,
            ..
        }
    ));
}

#[test]
fn identifier_roundtrip_through_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let db = build_sample(&store_path(&dir, "testtrail"));

    assert_eq!(db.trail_id(&cookie()).unwrap(), TrailId(0));
    assert_eq!(db.uuid(TrailId(0)).unwrap().hex(), COOKIE);
    assert!(db.contains(&cookie()));
    assert!(!db.contains(&Uuid::from_hex(&"0".repeat(32)).unwrap()));
}

#[test]
fn lexicons_over_the_file_backend() {
    let dir = tempfile::tempdir().unwrap();
    let db = build_sample(&store_path(&dir, "testtrail"));

    assert_eq!(db.lexicon_size(1u32).unwrap(), 3);
    assert_eq!(db.lexicon(1u32).unwrap(), vec!["a", "b", "c"]);
    assert_eq!(db.lexicon(2u32).unwrap(), vec!["1", "2", "3"]);
    assert!(matches!(
        db.lexicon(3u32).unwrap_err(),
        SpoorError::InvalidField { field: 3 }
    ));
}

#[test]
fn metadata_and_time_range() {
    let dir = tempfile::tempdir().unwrap();
    let db = build_sample(&store_path(&dir, "testtrail"));

    assert_eq!(db.min_timestamp(), 1);
    assert_eq!(db.max_timestamp(), 3);
    assert_eq!(db.time_range(), (1, 3));

    let (min, max) = db.time_range_utc().unwrap();
    assert_eq!(min.timestamp(), 1);
    assert_eq!(max.timestamp(), 3);
}

#[test]
fn append_across_stores() {
    let dir = tempfile::tempdir().unwrap();

    let mut cons = TrailConstructor::open(&store_path(&dir, "first"), &["field1"]).unwrap();
    cons.add(cookie(), 123u64, &["foobarbaz"]).unwrap();
    let first = cons.finalize().unwrap();

    let mut cons = TrailConstructor::open(&store_path(&dir, "second"), &["field1"]).unwrap();
    cons.add(cookie(), 124u64, &["barquuxmoo"]).unwrap();
    cons.append(&first).unwrap();
    let merged = cons.finalize().unwrap();

    assert_eq!(merged.num_events(), 2);
    let events: Vec<_> = merged
        .trail(TrailId(0))
        .unwrap()
        .collect::<spoor::Result<_>>()
        .unwrap();
    // Own adds first, appended store after: the documented merge order.
    assert_eq!(
        events.iter().map(|e| e.timestamp).collect::<Vec<_>>(),
        vec![124, 123]
    );
    assert_eq!(events[0].values, vec!["barquuxmoo"]);
    assert_eq!(events[1].values, vec!["foobarbaz"]);
}

#[test]
fn failed_lookups_leave_the_handle_usable() {
    let dir = tempfile::tempdir().unwrap();
    let db = build_sample(&store_path(&dir, "testtrail"));

    assert!(db.uuid(TrailId(99)).is_err());
    assert!(db
        .trail_id(&Uuid::from_hex(&"f".repeat(32)).unwrap())
        .is_err());

    // Both failures leave the handle fully functional.
    assert_eq!(db.num_events(), 3);
    assert_eq!(db.trail(TrailId(0)).unwrap().count(), 3);
}

#[test]
fn two_handles_on_one_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir, "testtrail");
    build_sample(&path);

    let db1 = TrailDb::open(&path).unwrap();
    let db2 = TrailDb::open(&path).unwrap();
    let n1 = db1.trail(TrailId(0)).unwrap().count();
    db1.close();
    // Closing one handle does not disturb the other.
    let n2 = db2.trail(TrailId(0)).unwrap().count();
    assert_eq!(n1, n2);
}
