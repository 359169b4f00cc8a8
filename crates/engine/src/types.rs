//! Input row types for the recommendation pipeline

use serde::{Deserialize, Serialize};

/// One purchase event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub user_id: u64,
    pub item_id: u64,
    pub quantity: f64,
    pub sales_value: f64,
    pub week_no: u32,
}

/// Descriptive attributes of a catalogue item
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemFeature {
    pub item_id: u64,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<u64>,
    #[serde(default)]
    pub commodity_desc: Option<String>,
    #[serde(default)]
    pub sub_commodity_desc: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
}

/// A transaction left-joined with its item features
///
/// `features` is `None` when the catalogue has no row for the item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub features: Option<ItemFeature>,
}

impl EnrichedTransaction {
    pub fn user_id(&self) -> u64 {
        self.transaction.user_id
    }

    pub fn item_id(&self) -> u64 {
        self.transaction.item_id
    }

    pub fn department(&self) -> Option<&str> {
        self.features
            .as_ref()
            .and_then(|f| f.department.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_transaction() {
        let json = r#"{"user_id": 2375, "item_id": 1004906, "quantity": 1.0, "sales_value": 1.39, "week_no": 1}"#;
        let t: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(t.user_id, 2375);
        assert_eq!(t.item_id, 1004906);
        assert_eq!(t.week_no, 1);
    }

    #[test]
    fn test_item_feature_missing_columns_default_to_none() {
        let json = r#"{"item_id": 25671, "department": "GROCERY"}"#;
        let f: ItemFeature = serde_json::from_str(json).unwrap();
        assert_eq!(f.department.as_deref(), Some("GROCERY"));
        assert!(f.brand.is_none());
        assert!(f.manufacturer.is_none());
    }

    #[test]
    fn test_enriched_department() {
        let transaction = Transaction {
            user_id: 1,
            item_id: 10,
            quantity: 1.0,
            sales_value: 7.5,
            week_no: 3,
        };
        let unmatched = EnrichedTransaction {
            transaction: transaction.clone(),
            features: None,
        };
        assert_eq!(unmatched.department(), None);

        let matched = EnrichedTransaction {
            transaction,
            features: Some(ItemFeature {
                item_id: 10,
                department: Some("KIOSK-GAS".to_string()),
                ..Default::default()
            }),
        };
        assert_eq!(matched.department(), Some("KIOSK-GAS"));
        assert_eq!(matched.item_id(), 10);
        assert_eq!(matched.user_id(), 1);
    }
}
