use depot_core::coordinate::ProjectVersion;
use depot_core::metadata::{StoreProjectVersionData, TransitiveDependencyReport};
use depot_core::store::{CoordinateStore, InMemoryStore};
use tempfile::TempDir;

fn pv(s: &str) -> ProjectVersion {
    ProjectVersion::parse(s).unwrap()
}

fn sample_store() -> InMemoryStore {
    InMemoryStore::from_records([
        StoreProjectVersionData::new(pv("org.a:a:1.0.0")).with_dependencies([pv("org.b:b:1.0.0")]),
        StoreProjectVersionData::new(pv("org.a:a:2.0.0")).with_dependencies([pv("org.b:b:1.0.0")]),
        StoreProjectVersionData::new(pv("org.b:b:1.0.0")).with_project_id("proj-b"),
    ])
}

#[test]
fn find_coordinate_hit_and_miss() {
    let store = sample_store();
    let found = store.find_coordinate("org.a", "a", "1.0.0").unwrap();
    assert_eq!(found.dependencies, vec![pv("org.b:b:1.0.0")]);
    assert!(store.find_coordinate("org.a", "a", "3.0.0").is_none());
    assert!(store.find(&pv("org.b:b:1.0.0")).is_some());
}

#[test]
fn find_all_is_sorted() {
    let store = sample_store();
    let all: Vec<String> = store
        .find_all_coordinates()
        .iter()
        .map(|r| r.coordinate.to_string())
        .collect();
    assert_eq!(all, vec!["org.a:a:1.0.0", "org.a:a:2.0.0", "org.b:b:1.0.0"]);
}

#[test]
fn find_by_prefix_filters_group_and_artifact() {
    let store = sample_store();
    assert_eq!(store.find_by_coordinate_prefix("org.a", "a").len(), 2);
    assert_eq!(store.find_by_coordinate_prefix("org.b", "b").len(), 1);
    assert!(store.find_by_coordinate_prefix("org.a", "b").is_empty());
}

#[test]
fn insert_replaces_and_remove_deletes() {
    let store = sample_store();
    store.insert(StoreProjectVersionData::new(pv("org.b:b:1.0.0")).excluded("bad metadata"));
    let b = store.find(&pv("org.b:b:1.0.0")).unwrap();
    assert!(b.excluded);
    assert_eq!(b.exclusion_reason(), "bad metadata");
    assert!(store.remove(&pv("org.b:b:1.0.0")).is_some());
    assert_eq!(store.len(), 2);
}

#[test]
fn restore_requests_are_recorded_once() {
    let store = sample_store();
    store.request_restore(&pv("org.b:b:1.0.0"));
    store.request_restore(&pv("org.b:b:1.0.0"));
    assert_eq!(store.restore_requests(), vec![pv("org.b:b:1.0.0")]);
}

#[test]
fn set_transitive_report_updates_known_only() {
    let store = sample_store();
    let report = TransitiveDependencyReport::valid([pv("org.b:b:1.0.0")]);
    assert!(store.set_transitive_report(&pv("org.a:a:1.0.0"), report.clone()));
    assert!(!store.set_transitive_report(&pv("org.x:x:1.0.0"), report.clone()));
    assert_eq!(
        store
            .find(&pv("org.a:a:1.0.0"))
            .unwrap()
            .transitive_dependencies_report,
        report
    );
}

#[test]
fn save_and_load_preserve_records() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("store.json");
    let store = sample_store();
    store.save(&path).unwrap();

    let loaded = InMemoryStore::load(&path).unwrap();
    assert_eq!(loaded.find_all_coordinates(), store.find_all_coordinates());
    assert_eq!(
        loaded.find(&pv("org.b:b:1.0.0")).unwrap().project_id.as_deref(),
        Some("proj-b")
    );
}

#[test]
fn load_minimal_json_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("store.json");
    std::fs::write(
        &path,
        r#"[{"groupId":"g","artifactId":"a","versionId":"1.0"}]"#,
    )
    .unwrap();
    let store = InMemoryStore::load(&path).unwrap();
    let record = store.find(&pv("g:a:1.0")).unwrap();
    assert!(record.dependencies.is_empty());
    assert!(!record.excluded);
    assert!(!record.evicted);
    assert!(!record.transitive_dependencies_report.valid);
}

#[test]
fn load_rejects_malformed_json() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("store.json");
    std::fs::write(&path, "{not json").unwrap();
    let err = InMemoryStore::load(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse"), "got: {err}");
}
