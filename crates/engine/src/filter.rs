//! Transaction prefiltering
//!
//! Narrows the raw purchase log down to the items worth modelling: items
//! bought by too many or too few users, the most recent weeks, uninteresting
//! departments and price outliers are removed before the matrix is built.

use crate::types::{EnrichedTransaction, ItemFeature, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Departments dropped from the training data
pub const EXCLUDED_DEPARTMENTS: [&str; 10] = [
    "GROCERY",
    "MISC. TRANS.",
    "PASTRY",
    "DRUG GM",
    "MEAT-PCKGD",
    "SEAFOOD-PCKGD",
    "PRODUCE",
    "NUTRITION",
    "DELI",
    "COSMETICS",
];

/// Prefilter thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Items bought by a larger share of users are dropped (default: 0.5)
    pub max_popularity: f64,
    /// Items bought by a smaller share of users are dropped (default: 0.01)
    pub min_popularity: f64,
    /// Rows newer than `max(week_no) - stale_weeks` are dropped (default: 48)
    pub stale_weeks: u32,
    pub excluded_departments: Vec<String>,
    /// Inclusive lower bound on `sales_value` (default: 5)
    pub min_price: f64,
    /// Inclusive upper bound on `sales_value` (default: 100)
    pub max_price: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_popularity: 0.5,
            min_popularity: 0.01,
            stale_weeks: 12 * 4,
            excluded_departments: EXCLUDED_DEPARTMENTS.iter().map(|d| d.to_string()).collect(),
            min_price: 5.0,
            max_price: 100.0,
        }
    }
}

/// Left-join transactions with item features on `item_id`
///
/// Items missing from the catalogue keep `None` features. If the catalogue
/// lists an item twice the first row wins.
pub fn join_item_features(
    transactions: &[Transaction],
    item_features: &[ItemFeature],
) -> Vec<EnrichedTransaction> {
    let mut catalogue: HashMap<u64, &ItemFeature> = HashMap::with_capacity(item_features.len());
    for feature in item_features {
        catalogue.entry(feature.item_id).or_insert(feature);
    }

    transactions
        .iter()
        .map(|t| EnrichedTransaction {
            transaction: t.clone(),
            features: catalogue.get(&t.item_id).map(|f| (*f).clone()),
        })
        .collect()
}

/// Share of distinct users who bought each item
pub fn item_popularity(rows: &[EnrichedTransaction]) -> HashMap<u64, f64> {
    let total_users = rows
        .iter()
        .map(|r| r.user_id())
        .collect::<HashSet<_>>()
        .len();
    if total_users == 0 {
        return HashMap::new();
    }

    let mut buyers: HashMap<u64, HashSet<u64>> = HashMap::new();
    for row in rows {
        buyers.entry(row.item_id()).or_default().insert(row.user_id());
    }

    buyers
        .into_iter()
        .map(|(item_id, users)| (item_id, users.len() as f64 / total_users as f64))
        .collect()
}

/// Reduce raw transactions to the subset used for training
///
/// Steps run in a fixed order; the week cutoff is relative to the newest week
/// still present when that step runs. An empty result is valid.
pub fn prefilter_items(
    transactions: &[Transaction],
    item_features: &[ItemFeature],
    config: &FilterConfig,
) -> Vec<EnrichedTransaction> {
    let mut data = join_item_features(transactions, item_features);
    tracing::debug!(rows = data.len(), "Joined item features");

    let popularity = item_popularity(&data);

    data.retain(|r| popularity[&r.item_id()] <= config.max_popularity);
    tracing::debug!(rows = data.len(), "Dropped top popular items");

    data.retain(|r| popularity[&r.item_id()] >= config.min_popularity);
    tracing::debug!(rows = data.len(), "Dropped rarely bought items");

    if let Some(max_week) = data.iter().map(|r| r.transaction.week_no).max() {
        let cutoff = i64::from(max_week) - i64::from(config.stale_weeks);
        data.retain(|r| i64::from(r.transaction.week_no) <= cutoff);
    }
    tracing::debug!(rows = data.len(), "Applied week cutoff");

    data.retain(|r| match r.department() {
        Some(dep) => !config.excluded_departments.iter().any(|d| d == dep),
        None => true,
    });
    tracing::debug!(rows = data.len(), "Dropped excluded departments");

    data.retain(|r| r.transaction.sales_value >= config.min_price);
    data.retain(|r| r.transaction.sales_value <= config.max_price);
    tracing::debug!(rows = data.len(), "Dropped price outliers");

    data
}
