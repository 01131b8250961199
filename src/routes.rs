//! Request handlers. Every call site goes through the shared filter
//! compiler and paginator instead of carrying its own copy.
//!
//! Reads fail open: when the store is unavailable the handlers log and
//! render an empty result set, so "no matches" and "store down" are
//! deliberately indistinguishable to the caller.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::is_admin,
    error::AppError,
    filters::{FilterParams, compile},
    models::{CatalogItem, Category, InterestEvent},
    pagination::{PAGE_SIZE, PageLink, paginate},
    ranking::{INTEREST_CLICK, RankedProduct, TOP_PRODUCTS_LIMIT, top_n},
    state::AppState,
};

const PRODUCTS_PATH: &str = "/products";

/// Stock level below which an item counts as a low-stock alert.
const LOW_STOCK_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub make: Option<String>,
    pub year: Option<String>,
    #[serde(rename = "minPrice")]
    pub min_price: Option<String>,
    #[serde(rename = "maxPrice")]
    pub max_price: Option<String>,
    pub page: Option<String>,
}

impl ListQuery {
    fn filter_params(&self) -> FilterParams {
        FilterParams {
            q: self.q.clone(),
            category: self.category.clone(),
            make: self.make.clone(),
            year: self.year.clone(),
            min_price: self.min_price.clone(),
            max_price: self.max_price.clone(),
        }
    }

    /// Set parameters in canonical order, for page links. `page` itself is
    /// excluded; the paginator overwrites it per link.
    fn active_params(&self) -> Vec<(String, String)> {
        [
            ("q", &self.q),
            ("category", &self.category),
            ("make", &self.make),
            ("year", &self.year),
            ("minPrice", &self.min_price),
            ("maxPrice", &self.max_price),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (key.to_string(), v.to_string()))
        })
        .collect()
    }
}

#[derive(Serialize)]
pub struct ProductListResponse {
    pub items: Vec<CatalogItem>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub links: Vec<PageLink>,
}

pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Json<ProductListResponse> {
    let predicates = compile(&query.filter_params());

    let total = match state.store.count(&predicates).await {
        Ok(total) => total,
        Err(e) => {
            warn!("Failed to count products: {e}");
            0
        }
    };

    let pagination = paginate(
        query.page.as_deref(),
        PAGE_SIZE,
        total,
        PRODUCTS_PATH,
        &query.active_params(),
    );

    let items = match state
        .store
        .find(&predicates, pagination.offset, PAGE_SIZE)
        .await
    {
        Ok(items) => items,
        Err(e) => {
            warn!("Failed to fetch products: {e}");
            Vec::new()
        }
    };

    Json(ProductListResponse {
        items,
        total,
        page: pagination.page,
        total_pages: pagination.total_pages,
        links: pagination.links,
    })
}

pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CatalogItem>, AppError> {
    let item = state.store.get(&id).await.unwrap_or_else(|e| {
        warn!("Failed to fetch product {id}: {e}");
        None
    });

    item.map(Json).ok_or(AppError::NotFound)
}

#[derive(Deserialize)]
pub struct TrackEventRequest {
    pub product_id: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

pub async fn track_event(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TrackEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = InterestEvent {
        id: Uuid::new_v4().to_string(),
        event_type: INTEREST_CLICK.to_string(),
        product_id: payload.product_id,
        metadata: payload.metadata,
        created_at: Utc::now(),
    };

    state
        .store
        .record_event(event)
        .await
        .map_err(|e| AppError::InternalError(Box::new(e)))?;

    Ok(StatusCode::CREATED)
}

/// Inventory form fields, shared by create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductPayload {
    pub make: String,
    pub model: Vec<String>,
    pub category: String,
    pub year: i32,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(default)]
    pub image_url: String,
}

impl ProductPayload {
    /// Checks the catalog invariants: category in the fixed enum, price
    /// non-negative, model list non-empty once blank entries are dropped.
    fn validate(&self) -> Result<(Category, Vec<String>), AppError> {
        let category: Category = self
            .category
            .parse()
            .map_err(|_| AppError::MalformedPayload)?;

        if !self.price.is_finite() || self.price < 0.0 {
            return Err(AppError::MalformedPayload);
        }

        let model: Vec<String> = self
            .model
            .iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if model.is_empty() {
            return Err(AppError::MalformedPayload);
        }

        Ok((category, model))
    }
}

pub async fn create_product(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    if !is_admin(&state.config, &headers) {
        return Err(AppError::Unauthorized);
    }
    let (category, model) = payload.validate()?;

    let item = CatalogItem {
        id: Uuid::new_v4().to_string(),
        make: payload.make,
        model,
        category,
        year: payload.year,
        name: payload.name,
        price: payload.price,
        quantity: payload.quantity,
        image_url: payload.image_url,
        created_at: Utc::now(),
    };

    state
        .store
        .insert(item.clone())
        .await
        .map_err(|e| AppError::InternalError(Box::new(e)))?;

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<CatalogItem>, AppError> {
    if !is_admin(&state.config, &headers) {
        return Err(AppError::Unauthorized);
    }
    let (category, model) = payload.validate()?;

    let existing = state
        .store
        .get(&id)
        .await
        .map_err(|e| AppError::InternalError(Box::new(e)))?
        .ok_or(AppError::NotFound)?;

    // Identity and creation time survive the edit.
    let item = CatalogItem {
        id: existing.id,
        make: payload.make,
        model,
        category,
        year: payload.year,
        name: payload.name,
        price: payload.price,
        quantity: payload.quantity,
        image_url: payload.image_url,
        created_at: existing.created_at,
    };

    let replaced = state
        .store
        .update(item.clone())
        .await
        .map_err(|e| AppError::InternalError(Box::new(e)))?;
    if !replaced {
        return Err(AppError::NotFound);
    }

    Ok(Json(item))
}

pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    if !is_admin(&state.config, &headers) {
        return Err(AppError::Unauthorized);
    }

    let removed = state
        .store
        .delete(&id)
        .await
        .map_err(|e| AppError::InternalError(Box::new(e)))?;
    if !removed {
        return Err(AppError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub total_products: usize,
    pub low_stock_count: usize,
    pub total_clicks: usize,
    pub top_products: Vec<RankedProduct>,
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DashboardResponse>, AppError> {
    if !is_admin(&state.config, &headers) {
        return Err(AppError::Unauthorized);
    }

    let products = match state.store.find(&[], 0, usize::MAX).await {
        Ok(products) => products,
        Err(e) => {
            warn!("Failed to fetch products for dashboard: {e}");
            Vec::new()
        }
    };

    let events = match state.store.events().await {
        Ok(events) => events,
        Err(e) => {
            warn!("Failed to fetch events for dashboard: {e}");
            Vec::new()
        }
    };

    let total_clicks = events
        .iter()
        .filter(|e| e.event_type == INTEREST_CLICK)
        .count();

    Ok(Json(DashboardResponse {
        total_products: products.len(),
        low_stock_count: products
            .iter()
            .filter(|p| p.quantity < LOW_STOCK_THRESHOLD)
            .count(),
        total_clicks,
        top_products: top_n(&events, &products, TOP_PRODUCTS_LIMIT),
    }))
}
