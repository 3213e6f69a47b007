//! Snapshot of one harvest run and its persisted shapes
//!
//! The persisted JSON is keyed by collection id and omits the id from the
//! records themselves:
//! `{ "marca_2": [ { "name", "price", "link", "image", "scraped_at" } ] }`.
//! The tabular export flattens it into rows with the collection id in a leading
//! `marca` column.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::price::Price;
use super::product::ProductRecord;

/// All records gathered across collections in one harvest run.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub captured_at: DateTime<Utc>,
    pub collections: BTreeMap<String, Vec<ProductRecord>>,
}

/// Record as written to the JSON export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub name: String,
    pub price: Option<Price>,
    pub link: Option<String>,
    pub image: Option<String>,
    #[serde(with = "timestamp")]
    pub scraped_at: DateTime<Utc>,
}

pub type PersistedSnapshot = BTreeMap<String, Vec<PersistedRecord>>;

/// Row of the tabular export; field order is the column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularRow {
    pub marca: String,
    pub name: String,
    pub price: Option<Price>,
    pub link: Option<String>,
    pub image: Option<String>,
    #[serde(with = "timestamp")]
    pub scraped_at: DateTime<Utc>,
}

pub const TABULAR_COLUMNS: [&str; 6] = ["marca", "name", "price", "link", "image", "scraped_at"];

impl Snapshot {
    pub fn new(captured_at: DateTime<Utc>) -> Self {
        Self {
            captured_at,
            collections: BTreeMap::new(),
        }
    }

    /// Add a collection's records; a repeated id appends to the existing list
    pub fn insert(&mut self, collection_id: impl Into<String>, records: Vec<ProductRecord>) {
        self.collections.entry(collection_id.into()).or_default().extend(records);
    }

    pub fn total_records(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_records() == 0
    }

    pub fn records(&self) -> impl Iterator<Item = &ProductRecord> {
        self.collections.values().flatten()
    }

    pub fn to_persisted(&self) -> PersistedSnapshot {
        self.collections
            .iter()
            .map(|(id, records)| {
                let persisted = records
                    .iter()
                    .map(|r| PersistedRecord {
                        name: r.name.clone(),
                        price: r.price,
                        link: r.link.clone(),
                        image: r.image.clone(),
                        scraped_at: r.observed_at,
                    })
                    .collect();
                (id.clone(), persisted)
            })
            .collect()
    }

    pub fn from_persisted(persisted: PersistedSnapshot, captured_at: DateTime<Utc>) -> Self {
        let collections = persisted
            .into_iter()
            .map(|(id, records)| {
                let records = records
                    .into_iter()
                    .map(|r| ProductRecord {
                        name: r.name,
                        price: r.price,
                        link: r.link,
                        image: r.image,
                        collection_id: id.clone(),
                        observed_at: r.scraped_at,
                    })
                    .collect();
                (id, records)
            })
            .collect();

        Self {
            captured_at,
            collections,
        }
    }

    pub fn tabular_rows(&self) -> Vec<TabularRow> {
        self.records()
            .map(|r| TabularRow {
                marca: r.collection_id.clone(),
                name: r.name.clone(),
                price: r.price,
                link: r.link.clone(),
                image: r.image.clone(),
                scraped_at: r.observed_at,
            })
            .collect()
    }
}

/// RFC 3339 timestamps. Naive ISO timestamps (no offset) from older exports are
/// read as UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(collection: &str, name: &str) -> ProductRecord {
        ProductRecord {
            name: name.to_string(),
            price: Some("12.5".parse().unwrap()),
            link: Some(format!("https://www.ligaswu.com.br/produto/{name}")),
            image: None,
            collection_id: collection.to_string(),
            observed_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn persisted_shape_omits_collection_id() {
        let mut snapshot = Snapshot::new(Utc::now());
        snapshot.insert("marca_2", vec![record("marca_2", "Luke")]);

        let json = serde_json::to_value(snapshot.to_persisted()).unwrap();
        let first = &json["marca_2"][0];
        assert_eq!(first["name"], "Luke");
        assert_eq!(first["price"], "12.5");
        assert_eq!(first["image"], serde_json::Value::Null);
        assert_eq!(first["scraped_at"], "2025-03-01T12:00:00Z");
        assert!(first.get("collection_id").is_none());
    }

    #[test]
    fn tabular_rows_carry_collection_id() {
        let mut snapshot = Snapshot::new(Utc::now());
        snapshot.insert("marca_2", vec![record("marca_2", "Luke")]);
        snapshot.insert("marca_4", vec![record("marca_4", "Leia"), record("marca_4", "Han")]);

        let rows = snapshot.tabular_rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].marca, "marca_2");
        assert_eq!(rows[2].name, "Han");
    }

    #[test]
    fn naive_timestamps_are_read_as_utc() {
        let parsed = timestamp::parse("2025-03-01T12:00:00.123456").unwrap();
        assert_eq!(parsed.timestamp_subsec_micros(), 123_456);
        assert!(timestamp::parse("yesterday").is_none());
    }

    #[test]
    fn repeated_collection_id_appends_records() {
        let mut snapshot = Snapshot::new(Utc::now());
        snapshot.insert("marca_2", vec![record("marca_2", "Luke")]);
        snapshot.insert("marca_2", vec![record("marca_2", "Leia")]);

        let names: Vec<&str> = snapshot.collections["marca_2"].iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Luke", "Leia"]);
        assert_eq!(snapshot.total_records(), 2);
    }

    #[test]
    fn empty_snapshot_is_valid() {
        let mut snapshot = Snapshot::new(Utc::now());
        snapshot.insert("marca_9", Vec::new());
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.collections.len(), 1);
    }
}
