//! # Filter Compiler
//!
//! Maps the recognized catalog query parameters to an ordered list of
//! predicates. Pure: the same parameter set always compiles to the same
//! list in the same order (q, category, make, year, minPrice, maxPrice).
//!
//! Filtering is strictly opt-in. A parameter that is absent, empty, or
//! fails to parse contributes no predicate, and unrecognized parameters
//! are ignored outright. The compiled list is ANDed by the storage
//! collaborator; nothing here touches storage.

use serde::Deserialize;

use crate::models::{CatalogItem, Category};

/// Recognized catalog query parameters, all optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub make: Option<String>,
    pub year: Option<String>,
    #[serde(rename = "minPrice")]
    pub min_price: Option<String>,
    #[serde(rename = "maxPrice")]
    pub max_price: Option<String>,
}

/// One filter condition over the catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Case-insensitive substring on the item name. Holds the lowered needle.
    NameContains(String),
    CategoryEq(Category),
    /// Case-insensitive substring on the make. Holds the lowered needle.
    MakeContains(String),
    YearEq(i32),
    PriceAtLeast(f64),
    PriceAtMost(f64),
}

impl Predicate {
    /// Evaluates this predicate against one item.
    pub fn matches(&self, item: &CatalogItem) -> bool {
        match self {
            Predicate::NameContains(needle) => item.name.to_lowercase().contains(needle),
            Predicate::CategoryEq(category) => item.category == *category,
            Predicate::MakeContains(needle) => item.make.to_lowercase().contains(needle),
            Predicate::YearEq(year) => item.year == *year,
            Predicate::PriceAtLeast(min) => item.price >= *min,
            Predicate::PriceAtMost(max) => item.price <= *max,
        }
    }
}

/// Compiles the parameter set to its predicate list.
pub fn compile(params: &FilterParams) -> Vec<Predicate> {
    let mut predicates = Vec::new();

    if let Some(q) = set(&params.q) {
        predicates.push(Predicate::NameContains(q.to_lowercase()));
    }
    if let Some(category) = set(&params.category) {
        if let Ok(category) = category.parse() {
            predicates.push(Predicate::CategoryEq(category));
        }
    }
    if let Some(make) = set(&params.make) {
        predicates.push(Predicate::MakeContains(make.to_lowercase()));
    }
    if let Some(year) = set(&params.year) {
        if let Ok(year) = year.parse() {
            predicates.push(Predicate::YearEq(year));
        }
    }
    if let Some(min) = set(&params.min_price).and_then(parse_finite) {
        predicates.push(Predicate::PriceAtLeast(min));
    }
    if let Some(max) = set(&params.max_price).and_then(parse_finite) {
        predicates.push(Predicate::PriceAtMost(max));
    }

    predicates
}

/// Empty string is equivalent to absent.
fn set(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// "NaN" and "inf" parse as f64 but make no usable price bound.
fn parse_finite(value: &str) -> Option<f64> {
    value.parse().ok().filter(|v: &f64| v.is_finite())
}
