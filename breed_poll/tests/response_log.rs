use breed_poll::builder::CatalogBuilder;
use breed_poll::response_log::ResponseLog;
use breed_poll::*;

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::thread;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn herding_catalog() -> Catalog {
    let mut builder = CatalogBuilder::new(GroupOrder::FirstSeen);
    builder.add_breed("Border Collie", "Herding").unwrap();
    builder.add_breed("Corgi", "Herding").unwrap();
    builder.add_breed("Poodle", "Non-Sporting").unwrap();
    builder.build().unwrap()
}

fn form(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn round_trip_with_missing_group() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let catalog = herding_catalog();
    let log = ResponseLog::new(dir.path().join("responses.csv"), SchemaPolicy::Reject);

    let sub = catalog.submission(&form(&[
        ("person_name", "Alice"),
        ("herding", "Border Collie"),
        ("best_in_show", "Poodle"),
    ]));
    let row = log.append(&catalog, &sub).unwrap();
    assert_eq!(row.timestamp.len(), "2024-05-01T10:00:00".len());

    let contents = log.read_all().unwrap();
    assert_eq!(
        contents.columns,
        vec!["timestamp", "Name", "Herding", "Non-Sporting", "Best in Show"]
    );
    assert_eq!(contents.rows.len(), 1);
    let read = &contents.rows[0];
    assert_eq!(read["timestamp"], row.timestamp);
    assert_eq!(read["Name"], "Alice");
    assert_eq!(read["Herding"], "Border Collie");
    assert_eq!(read["Non-Sporting"], "");
    assert_eq!(read["Best in Show"], "Poodle");
}

#[test]
fn append_preserves_prior_rows() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("responses.csv");
    let catalog = herding_catalog();
    let log = ResponseLog::new(&path, SchemaPolicy::Reject);

    for name in ["Alice", "Bob", "Carol"] {
        log.append(&catalog, &catalog.submission(&form(&[("person_name", name)])))
            .unwrap();
    }
    let before = fs::read(&path).unwrap();
    assert_eq!(log.read_all().unwrap().rows.len(), 3);

    log.append(&catalog, &catalog.submission(&form(&[("person_name", "Dave")])))
        .unwrap();
    let after = fs::read(&path).unwrap();
    assert!(after.starts_with(&before));

    let contents = log.read_all().unwrap();
    let names: Vec<&str> = contents.rows.iter().map(|r| r["Name"].as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob", "Carol", "Dave"]);
}

#[test]
fn header_written_once() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("responses.csv");
    let catalog = herding_catalog();
    let log = ResponseLog::new(&path, SchemaPolicy::Reject);

    for _ in 0..5 {
        log.append(&catalog, &Submission::default()).unwrap();
    }
    let text = fs::read_to_string(&path).unwrap();
    let header = catalog.columns().join(",");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], header);
    assert_eq!(lines.iter().filter(|l| **l == header).count(), 1);
}

#[test]
fn concurrent_appends_are_serialized() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("responses.csv");
    let catalog = Arc::new(herding_catalog());
    let log = Arc::new(ResponseLog::new(&path, SchemaPolicy::Reject));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let catalog = catalog.clone();
            let log = log.clone();
            thread::spawn(move || {
                let name = format!("voter-{}", i);
                let sub = catalog.submission(&form(&[("person_name", name.as_str())]));
                log.append(&catalog, &sub).unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let text = fs::read_to_string(&path).unwrap();
    let header = catalog.columns().join(",");
    assert_eq!(text.lines().filter(|l| *l == header).count(), 1);

    let contents = log.read_all().unwrap();
    assert_eq!(contents.rows.len(), 8);
    for row in contents.rows.iter() {
        assert!(row["Name"].starts_with("voter-"));
        assert_eq!(row["Herding"], "");
    }
}

#[test]
fn append_after_unterminated_last_row() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("responses.csv");
    let before = "timestamp,Name,Herding,Non-Sporting,Best in Show\n\
                  2024-01-01T00:00:00,Bob,,,";
    fs::write(&path, before).unwrap();

    let catalog = herding_catalog();
    let log = ResponseLog::new(&path, SchemaPolicy::Reject);
    assert_eq!(log.read_all().unwrap().rows.len(), 1);

    log.append(&catalog, &catalog.submission(&form(&[("person_name", "Alice")])))
        .unwrap();

    let after = fs::read_to_string(&path).unwrap();
    assert!(after.starts_with(before));
    let contents = log.read_all().unwrap();
    assert_eq!(contents.rows.len(), 2);
    assert_eq!(contents.rows[0]["Name"], "Bob");
    assert_eq!(contents.rows[0]["Best in Show"], "");
    assert_eq!(contents.rows[1]["Name"], "Alice");
}

#[test]
fn append_after_header_without_line_break() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("responses.csv");
    fs::write(&path, "timestamp,Name,Herding,Non-Sporting,Best in Show").unwrap();

    let catalog = herding_catalog();
    let log = ResponseLog::new(&path, SchemaPolicy::Reject);
    log.append(&catalog, &Submission::default()).unwrap();

    let contents = log.read_all().unwrap();
    assert_eq!(contents.columns, catalog.columns());
    assert_eq!(contents.rows.len(), 1);
}
