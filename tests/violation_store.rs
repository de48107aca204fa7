//! Store contract tests, run against both implementations.

use ridesecure::{
    InMemoryViolationStore, SqliteViolationStore, Violation, ViolationStore,
};
use ridesecure::store::{STATUS_DETECTED, STATUS_PROCESSED, VIOLATION_TYPE_NO_HELMET};

fn sample(frame: i64, confidence: f64, plate: &str) -> Violation {
    let mut v = Violation::new("traffic_cam.mp4", frame, confidence);
    v.license_plate = Some(plate.to_string());
    v.plate_confidence = Some(0.9);
    v.location_info = Some("Traffic Junction 3".to_string());
    v
}

fn roundtrip(store: &mut dyn ViolationStore) {
    let mut v = sample(125, 0.85, "MH12AB3456");
    let id = store.save(&mut v).unwrap();
    assert_eq!(v.id, Some(id));

    let listed = store.list_all().unwrap();
    assert_eq!(listed.len(), 1);
    let got = &listed[0];
    assert_eq!(got.id, Some(id));
    assert_eq!(got.video_source, "traffic_cam.mp4");
    assert_eq!(got.frame_number, 125);
    assert!((got.detection_confidence - 0.85).abs() < 1e-9);
    assert_eq!(got.license_plate.as_deref(), Some("MH12AB3456"));
    assert_eq!(got.plate_confidence, Some(0.9));
    assert_eq!(got.location_info.as_deref(), Some("Traffic Junction 3"));
    assert_eq!(got.violation_type, VIOLATION_TYPE_NO_HELMET);
    assert_eq!(got.status, STATUS_DETECTED);
}

fn newest_first(store: &mut dyn ViolationStore) {
    for i in 0..3 {
        store.save(&mut sample(i, 0.8, "KA01XX0001")).unwrap();
    }
    let mut latest = sample(99, 0.85, "MH12AB3456");
    store.save(&mut latest).unwrap();

    let listed = store.list_all().unwrap();
    assert_eq!(listed.len(), 4);
    assert_eq!(listed[0].id, latest.id);
    assert_eq!(listed[0].license_plate.as_deref(), Some("MH12AB3456"));
}

fn plate_search_is_substring(store: &mut dyn ViolationStore) {
    store.save(&mut sample(1, 0.8, "MH12AB3456")).unwrap();
    store.save(&mut sample(2, 0.8, "KA01XX0001")).unwrap();
    store.save(&mut sample(3, 0.8, "MH12CD0042")).unwrap();
    let mut unplated = Violation::new("traffic_cam.mp4", 4, 0.8);
    store.save(&mut unplated).unwrap();

    let hits = store.list_by_license_plate("MH12").unwrap();
    assert_eq!(hits.len(), 2);
    let hits = store.list_by_license_plate("AB3456").unwrap();
    assert_eq!(hits.len(), 1);
    let hits = store.list_by_license_plate("ZZ").unwrap();
    assert!(hits.is_empty());
}

fn status_updates(store: &mut dyn ViolationStore) {
    let mut v = sample(1, 0.8, "MH12AB3456");
    let id = store.save(&mut v).unwrap();

    assert!(store.update_status(id, STATUS_PROCESSED).unwrap());
    let got = &store.list_all().unwrap()[0];
    assert_eq!(got.status, STATUS_PROCESSED);
    assert!(got.updated_at >= got.created_at);

    assert!(!store.update_status(id + 1000, STATUS_PROCESSED).unwrap());
}

fn deletes(store: &mut dyn ViolationStore) {
    let id1 = store.save(&mut sample(1, 0.8, "MH12AB3456")).unwrap();
    let _id2 = store.save(&mut sample(2, 0.8, "KA01XX0001")).unwrap();

    assert!(store.delete(id1).unwrap());
    assert!(!store.delete(id1).unwrap());
    assert_eq!(store.list_all().unwrap().len(), 1);

    assert_eq!(store.delete_all().unwrap(), 1);
    assert!(store.list_all().unwrap().is_empty());
}

fn stats_track_status_counts(store: &mut dyn ViolationStore) {
    let empty = store.stats().unwrap();
    assert_eq!(empty.total, 0);
    assert_eq!(empty.average_confidence, 0.0);

    let id = store.save(&mut sample(1, 0.6, "MH12AB3456")).unwrap();
    store.save(&mut sample(2, 1.0, "KA01XX0001")).unwrap();
    store.update_status(id, STATUS_PROCESSED).unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.processed, 1);
    assert!((stats.average_confidence - 0.8).abs() < 1e-9);
}

fn session_lifecycle(store: &mut dyn ViolationStore) {
    let id = store.start_session("evening patrol", "/videos/cam1.mp4").unwrap();

    let open = store.get_session(id).unwrap().unwrap();
    assert_eq!(open.session_name, "evening patrol");
    assert_eq!(open.status, "RUNNING");
    assert!(open.end_time.is_none());

    assert!(store.end_session(id, 500, 7).unwrap());
    let closed = store.get_session(id).unwrap().unwrap();
    assert_eq!(closed.status, "COMPLETED");
    assert_eq!(closed.total_frames, 500);
    assert_eq!(closed.violations_detected, 7);
    assert!(closed.end_time.is_some());

    assert!(!store.end_session(id + 1000, 0, 0).unwrap());
    assert!(store.get_session(id + 1000).unwrap().is_none());
}

fn invalid_records_are_rejected(store: &mut dyn ViolationStore) {
    let mut bad = Violation::new("traffic_cam.mp4", 1, 1.5);
    assert!(store.save(&mut bad).is_err());
    assert_eq!(bad.id, None);

    let mut bad_plate = sample(1, 0.8, "MH12AB3456");
    bad_plate.plate_confidence = Some(7.0);
    assert!(store.save(&mut bad_plate).is_err());

    assert_eq!(store.stats().unwrap().total, 0);
}

fn run_contract_suite(make: impl Fn() -> Box<dyn ViolationStore>) {
    roundtrip(make().as_mut());
    newest_first(make().as_mut());
    plate_search_is_substring(make().as_mut());
    status_updates(make().as_mut());
    deletes(make().as_mut());
    stats_track_status_counts(make().as_mut());
    session_lifecycle(make().as_mut());
    invalid_records_are_rejected(make().as_mut());
}

#[test]
fn sqlite_store_honors_the_contract() {
    run_contract_suite(|| Box::new(SqliteViolationStore::open_in_memory().unwrap()));
}

#[test]
fn in_memory_store_honors_the_contract() {
    run_contract_suite(|| Box::new(InMemoryViolationStore::new()));
}

#[test]
fn sqlite_store_persists_across_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("violations.db");
    let db_path = db_path.to_str().unwrap();

    let saved_id = {
        let mut store = SqliteViolationStore::open(db_path).unwrap();
        store.save(&mut sample(125, 0.85, "MH12AB3456")).unwrap()
    };

    let store = SqliteViolationStore::open(db_path).unwrap();
    let listed = store.list_all().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, Some(saved_id));
    assert_eq!(listed[0].license_plate.as_deref(), Some("MH12AB3456"));
}
