use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::price::Price;

/// One observed product on one listing page at one point in time.
///
/// `name` is the identity key within a snapshot, but records are not
/// deduplicated here: a product listed twice yields two records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub price: Option<Price>,
    pub link: Option<String>,
    pub image: Option<String>,
    pub collection_id: String,
    pub observed_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Price only when it is present and strictly positive.
    pub fn positive_price(&self) -> Option<Price> {
        self.price.filter(Price::is_positive)
    }
}

/// Result of extracting one optional field from a card.
///
/// Expected absence and a value that was present but could not be parsed are
/// kept apart so callers can report the latter without treating it as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome<T> {
    Present(T),
    Absent,
    Unparsable { raw: String, reason: String },
}

impl<T> FieldOutcome<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent | Self::Unparsable { .. } => None,
        }
    }

    pub fn is_unparsable(&self) -> bool {
        matches!(self, Self::Unparsable { .. })
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FieldOutcome<U> {
        match self {
            Self::Present(value) => FieldOutcome::Present(f(value)),
            Self::Absent => FieldOutcome::Absent,
            Self::Unparsable { raw, reason } => FieldOutcome::Unparsable { raw, reason },
        }
    }
}

impl<T> From<Option<T>> for FieldOutcome<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Self::Present)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparsable_collapses_to_none() {
        let outcome: FieldOutcome<u32> = FieldOutcome::Unparsable {
            raw: "abc".into(),
            reason: "no digits".into(),
        };
        assert!(outcome.is_unparsable());
        assert_eq!(outcome.into_option(), None);
        assert_eq!(FieldOutcome::Present(3).map(|v| v * 2).into_option(), Some(6));
    }

    #[test]
    fn zero_price_is_not_positive() {
        let record = ProductRecord {
            name: "Card".into(),
            price: Some(Price::from_parts(0, 0)),
            link: None,
            image: None,
            collection_id: "marca_2".into(),
            observed_at: Utc::now(),
        };
        assert_eq!(record.positive_price(), None);
    }
}
