//! # Catalog Data
//!
//! Items and interest events as this layer sees them. Both are owned by the
//! storage collaborator; everything here only reads or derives from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};

/// Fixed set of catalog categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Engines and Transmissions")]
    EnginesAndTransmissions,
    Suspension,
    #[serde(rename = "Wheels and Tires")]
    WheelsAndTires,
    #[serde(rename = "Body Panels")]
    BodyPanels,
    Accessories,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::EnginesAndTransmissions,
        Category::Suspension,
        Category::WheelsAndTires,
        Category::BodyPanels,
        Category::Accessories,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::EnginesAndTransmissions => "Engines and Transmissions",
            Category::Suspension => "Suspension",
            Category::WheelsAndTires => "Wheels and Tires",
            Category::BodyPanels => "Body Panels",
            Category::Accessories => "Accessories",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or(())
    }
}

/// A part in the catalog.
///
/// Invariants held by the store: `model` is non-empty, `price` is
/// non-negative, `category` is one of the fixed variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub make: String,
    pub model: Vec<String>,
    pub category: Category,
    pub year: i32,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// A recorded click of interest in a product.
///
/// `product_id` may reference an item that has since been deleted; the
/// reference is never required to resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestEvent {
    pub id: String,
    pub event_type: String,
    pub product_id: Option<String>,
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}
