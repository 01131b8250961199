//! # Rank Aggregator
//!
//! Builds the dashboard leaderboard: group interest clicks by product,
//! count, sort descending, join against the current catalog, keep the top
//! N. Events referencing a since-deleted product stay on the board under a
//! placeholder name instead of being dropped.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::{CatalogItem, InterestEvent};

/// Event tag counted by the leaderboard.
pub const INTEREST_CLICK: &str = "interest_click";

/// Dashboard leaderboard length.
pub const TOP_PRODUCTS_LIMIT: usize = 5;

pub const UNKNOWN_PRODUCT: &str = "Unknown Product";
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedProduct {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub count: u64,
}

/// Top `n` products by interest clicks.
///
/// Ties keep first-seen order: the sort is stable and no secondary key is
/// imposed. Events without a product reference cannot be grouped and are
/// skipped. Returns at most `min(n, distinct referenced ids)` rows.
pub fn top_n(events: &[InterestEvent], products: &[CatalogItem], n: usize) -> Vec<RankedProduct> {
    let mut counts: Vec<(&str, u64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for event in events {
        if event.event_type != INTEREST_CLICK {
            continue;
        }
        let Some(product_id) = event.product_id.as_deref() else {
            continue;
        };
        match index.get(product_id) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(product_id, counts.len());
                counts.push((product_id, 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(n);

    let by_id: HashMap<&str, &CatalogItem> =
        products.iter().map(|p| (p.id.as_str(), p)).collect();

    counts
        .into_iter()
        .map(|(product_id, count)| match by_id.get(product_id) {
            Some(product) => RankedProduct {
                product_id: product_id.to_string(),
                name: product.name.clone(),
                category: product.category.to_string(),
                count,
            },
            None => RankedProduct {
                product_id: product_id.to_string(),
                name: UNKNOWN_PRODUCT.to_string(),
                category: UNCATEGORIZED.to_string(),
                count,
            },
        })
        .collect()
}
