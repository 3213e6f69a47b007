//! Snapshot exports written to and read back from a temporary data directory
use std::fs;

use catalog_harvester_lib::domain::{latest_per_product, price_history, Price, ProductRecord, Snapshot};
use catalog_harvester_lib::infrastructure::SnapshotStore;
use chrono::{DateTime, TimeZone, Utc};

fn record(collection: &str, name: &str, price: Option<&str>, observed_at: DateTime<Utc>) -> ProductRecord {
    ProductRecord {
        name: name.to_string(),
        price: price.map(|p| p.parse::<Price>().unwrap()),
        link: Some(format!("https://www.ligaswu.com.br/?view=cards/card&card={}", name.replace(' ', "+"))),
        image: Some("https://repositorio.sbrauble.com/arquivos/x.jpg".to_string()),
        collection_id: collection.to_string(),
        observed_at,
    }
}

fn snapshot(captured_at: DateTime<Utc>, vader_price: &str) -> Snapshot {
    let observed_at = captured_at + chrono::Duration::milliseconds(1234);
    let mut snapshot = Snapshot::new(captured_at);
    snapshot.insert(
        "marca_2",
        vec![
            record("marca_2", "Darth Vader", Some(vader_price), observed_at),
            record("marca_2", "Ahsoka Tano", None, observed_at),
        ],
    );
    snapshot.insert("marca_4", vec![record("marca_4", "Boba Fett", Some("0"), observed_at)]);
    snapshot.insert("marca_9", Vec::new());
    snapshot
}

#[test]
fn json_round_trip_preserves_records() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path(), "liga_precos");
    let written = snapshot(Utc.with_ymd_and_hms(2024, 5, 4, 9, 0, 0).unwrap(), "1234.56");

    let path = store.write_json(&written).unwrap();
    let loaded = store.load_json(&path).unwrap();

    assert_eq!(loaded.collections, written.collections);
    assert_eq!(loaded.captured_at, written.captured_at);
}

#[test]
fn json_shape_is_keyed_by_collection() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path(), "liga_precos");
    let path = store
        .write_json(&snapshot(Utc.with_ymd_and_hms(2024, 5, 4, 9, 0, 0).unwrap(), "1234.56"))
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    let vader = &value["marca_2"][0];
    assert_eq!(vader["name"], "Darth Vader");
    assert_eq!(vader["price"], "1234.56");
    assert!(vader["scraped_at"].as_str().unwrap().starts_with("2024-05-04T09:00:01.234"));
    assert!(vader.get("collection_id").is_none());
    assert_eq!(value["marca_2"][1]["price"], serde_json::Value::Null);
    assert_eq!(value["marca_9"], serde_json::json!([]));
}

#[test]
fn csv_rows_follow_fixed_columns() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path(), "liga_precos");
    let path = store
        .write_csv(&snapshot(Utc.with_ymd_and_hms(2024, 5, 4, 9, 0, 0).unwrap(), "99.9"))
        .unwrap()
        .unwrap();

    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(headers, vec!["marca", "name", "price", "link", "image", "scraped_at"]);

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[0][0], "marca_2");
    assert_eq!(&rows[0][2], "99.9");
    assert_eq!(&rows[1][2], "");
    assert_eq!(&rows[2][0], "marca_4");
}

#[test]
fn load_all_folds_into_price_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path(), "liga_precos");
    store
        .write_json(&snapshot(Utc.with_ymd_and_hms(2024, 5, 4, 9, 0, 0).unwrap(), "120"))
        .unwrap();
    store
        .write_json(&snapshot(Utc.with_ymd_and_hms(2024, 5, 4, 15, 0, 0).unwrap(), "99.9"))
        .unwrap();
    fs::write(dir.path().join("liga_precos_broken.json"), "{ not json").unwrap();
    fs::write(dir.path().join("notes.json"), "{}").unwrap();

    let snapshots = store.load_all().unwrap();
    assert_eq!(snapshots.len(), 2);
    assert!(snapshots[0].captured_at < snapshots[1].captured_at);

    let history = price_history(&snapshots, "Darth Vader");
    let prices: Vec<String> = history.iter().map(|p| p.price.to_string()).collect();
    assert_eq!(prices, vec!["120", "99.9"]);

    // Zero and missing prices never enter a history
    assert!(price_history(&snapshots, "Boba Fett").is_empty());
    assert!(price_history(&snapshots, "Ahsoka Tano").is_empty());

    let latest = latest_per_product(&snapshots);
    let vader = latest.iter().find(|r| r.name == "Darth Vader").unwrap();
    assert_eq!(vader.price.unwrap().to_string(), "99.9");
    assert_eq!(latest.len(), 3);
}

#[test]
fn older_naive_timestamps_are_read_as_utc() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path(), "liga_precos");
    let path = dir.path().join("liga_precos_20240101_080000.json");
    fs::write(
        &path,
        r#"{"marca_79": [{"name": "Rey", "price": "R$ 12,50", "link": null, "image": null, "scraped_at": "2024-01-01T08:00:00.123456"}]}"#,
    )
    .unwrap();

    let loaded = store.load_json(&path).unwrap();
    let rey = &loaded.collections["marca_79"][0];
    assert_eq!(rey.price.unwrap().to_string(), "12.5");
    assert_eq!(rey.observed_at, Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap() + chrono::Duration::microseconds(123_456));
    assert_eq!(loaded.captured_at, Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap());
}
