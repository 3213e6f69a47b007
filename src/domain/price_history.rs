//! Price-history fold over persisted snapshots
//!
//! Downstream views built from every snapshot on disk: the latest observation
//! of each product, and per-product price series.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::price::Price;
use super::product::ProductRecord;
use super::snapshot::Snapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub observed_at: DateTime<Utc>,
    pub price: Price,
    pub collection_id: String,
}

/// Latest record per product name, sorted by name.
pub fn latest_per_product(snapshots: &[Snapshot]) -> Vec<ProductRecord> {
    let mut latest: BTreeMap<&str, &ProductRecord> = BTreeMap::new();
    for record in snapshots.iter().flat_map(Snapshot::records) {
        latest
            .entry(record.name.as_str())
            .and_modify(|current| {
                if record.observed_at > current.observed_at {
                    *current = record;
                }
            })
            .or_insert(record);
    }
    latest.into_values().cloned().collect()
}

/// Positive-price observations of one product, oldest first.
pub fn price_history(snapshots: &[Snapshot], name: &str) -> Vec<PricePoint> {
    let mut points: Vec<PricePoint> = snapshots
        .iter()
        .flat_map(Snapshot::records)
        .filter(|r| r.name == name)
        .filter_map(to_point)
        .collect();
    points.sort_by_key(|p| p.observed_at);
    points
}

/// Price series for every product with at least one positive price.
pub fn price_histories(snapshots: &[Snapshot]) -> BTreeMap<String, Vec<PricePoint>> {
    let mut histories: BTreeMap<String, Vec<PricePoint>> = BTreeMap::new();
    for record in snapshots.iter().flat_map(Snapshot::records) {
        if let Some(point) = to_point(record) {
            histories.entry(record.name.clone()).or_default().push(point);
        }
    }
    for points in histories.values_mut() {
        points.sort_by_key(|p| p.observed_at);
    }
    histories
}

fn to_point(record: &ProductRecord) -> Option<PricePoint> {
    record.positive_price().map(|price| PricePoint {
        observed_at: record.observed_at,
        price,
        collection_id: record.collection_id.clone(),
    })
}
