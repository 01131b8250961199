use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use partstore::{
    admission::{AdmissionStore, MemoryAdmissionStore, WINDOW},
    app,
    config::Config,
    filters::Predicate,
    models::{CatalogItem, Category, InterestEvent},
    state::AppState,
    store::{CatalogStore, MemoryStore, StoreError},
};

fn test_config() -> Config {
    Config {
        port: 0,
        admin_token: "s3cret".to_string(),
        static_prefixes: vec!["/assets".to_string(), "/favicon.ico".to_string()],
    }
}

fn test_app(store: Arc<dyn CatalogStore>, admission: Arc<dyn AdmissionStore>) -> Router {
    app(AppState::with_parts(test_config(), store, admission))
}

fn item(id: &str, name: &str, category: Category, price: f64, quantity: u32) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        make: "Toyota".to_string(),
        model: vec!["Land Cruiser".to_string()],
        category,
        year: 2015,
        name: name.to_string(),
        price,
        quantity,
        image_url: String::new(),
        created_at: Utc::now(),
    }
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn listing_applies_filters_and_pagination() {
    let store = Arc::new(MemoryStore::with_items(vec![
        item("1", "Front Strut", Category::Suspension, 90.0, 4),
        item("2", "Coil Spring", Category::Suspension, 450.0, 1),
        item("3", "Hood Panel", Category::BodyPanels, 90.0, 2),
    ]));
    let router = test_app(store, Arc::new(MemoryAdmissionStore::new()));

    let (status, body) = get(&router, "/products?category=Suspension&maxPrice=100").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["page"], 1);
    assert_eq!(body["total_pages"], 1);
    assert_eq!(body["items"][0]["id"], "1");
    // Single page: no controls.
    assert_eq!(body["links"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn listing_links_carry_active_filters() {
    let items = (0..40)
        .map(|i| item(&format!("p{i}"), "Strut", Category::Suspension, 50.0, 1))
        .collect();
    let router = test_app(
        Arc::new(MemoryStore::with_items(items)),
        Arc::new(MemoryAdmissionStore::new()),
    );

    let (status, body) = get(&router, "/products?category=Suspension&page=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_pages"], 2);
    let links = body["links"].as_array().unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links[1]["href"], "/products?category=Suspension&page=2");
    assert_eq!(links[0]["current"], true);
}

#[tokio::test]
async fn detail_returns_404_for_missing_item() {
    let router = test_app(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryAdmissionStore::new()),
    );

    let (status, _) = get(&router, "/products/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn requests_past_the_limit_get_429() {
    let router = test_app(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryAdmissionStore::with_limits(WINDOW, 2)),
    );

    for _ in 0..2 {
        let (status, _) = get(&router, "/products").await;
        assert_eq!(status, StatusCode::OK);
    }

    let response = router
        .clone()
        .oneshot(Request::get("/products").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"Too Many Requests");
}

#[tokio::test]
async fn identities_are_limited_independently() {
    let router = test_app(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryAdmissionStore::with_limits(WINDOW, 1)),
    );

    for ip in ["203.0.113.1", "203.0.113.2"] {
        let response = router
            .clone()
            .oneshot(
                Request::get("/products")
                    .header("x-forwarded-for", ip)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Same identity again: over the limit.
    let response = router
        .clone()
        .oneshot(
            Request::get("/products")
                .header("x-forwarded-for", "203.0.113.1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn static_assets_bypass_the_gate() {
    let router = test_app(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryAdmissionStore::with_limits(WINDOW, 1)),
    );

    for _ in 0..5 {
        let (status, _) = get(&router, "/assets/logo.png").await;
        // Unrouted, but never rate limited.
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn dashboard_requires_admin_token() {
    let router = test_app(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryAdmissionStore::new()),
    );

    let (status, _) = get(&router, "/dashboard").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tracked_clicks_show_up_on_the_dashboard() {
    let store = Arc::new(MemoryStore::with_items(vec![
        item("a", "Front Strut", Category::Suspension, 90.0, 1),
        item("b", "Coil Spring", Category::Suspension, 45.0, 8),
    ]));
    let router = test_app(store, Arc::new(MemoryAdmissionStore::new()));

    for product_id in ["a", "a", "b"] {
        let response = router
            .clone()
            .oneshot(
                Request::post("/events")
                    .header("content-type", "application/json")
                    .body(Body::from(format!(
                        "{{\"product_id\":\"{product_id}\"}}"
                    )))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = router
        .clone()
        .oneshot(
            Request::get("/dashboard")
                .header("x-admin-token", "s3cret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["total_products"], 2);
    assert_eq!(body["low_stock_count"], 1);
    assert_eq!(body["total_clicks"], 3);

    let top = body["top_products"].as_array().unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0]["product_id"], "a");
    assert_eq!(top[0]["count"], 2);
    assert_eq!(top[0]["name"], "Front Strut");
    assert_eq!(top[1]["product_id"], "b");
}

fn json_request(method: &str, uri: &str, admin: bool, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if admin {
        builder = builder.header("x-admin-token", "s3cret");
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn payload() -> Value {
    serde_json::json!({
        "make": "Toyota",
        "model": ["Hilux", "Land Cruiser"],
        "category": "Suspension",
        "year": 2014,
        "name": "Front Strut",
        "price": 120.0,
        "quantity": 6,
        "image_url": "/images/strut.jpeg"
    })
}

#[tokio::test]
async fn inventory_crud_round_trip() {
    let router = test_app(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryAdmissionStore::new()),
    );

    let response = router
        .clone()
        .oneshot(json_request("POST", "/products", true, &payload()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let created: Value = serde_json::from_slice(&bytes).unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    let created_at = created["created_at"].clone();

    let (status, listing) = get(&router, "/products?category=Suspension").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["items"][0]["id"], id.as_str());

    let mut edited = payload();
    edited["price"] = serde_json::json!(95.0);
    let response = router
        .clone()
        .oneshot(json_request("PUT", &format!("/products/{id}"), true, &edited))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let updated: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(updated["price"], 95.0);
    assert_eq!(updated["id"], id.as_str());
    // Edits never move an item's creation time.
    assert_eq!(updated["created_at"], created_at);

    let response = router
        .clone()
        .oneshot(
            Request::delete(format!("/products/{id}"))
                .header("x-admin-token", "s3cret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (_, listing) = get(&router, "/products").await;
    assert_eq!(listing["total"], 0);

    let (status, _) = get(&router, &format!("/products/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn inventory_writes_require_admin_token() {
    let router = test_app(
        Arc::new(MemoryStore::with_items(vec![item(
            "a",
            "Front Strut",
            Category::Suspension,
            90.0,
            1,
        )])),
        Arc::new(MemoryAdmissionStore::new()),
    );

    let response = router
        .clone()
        .oneshot(json_request("POST", "/products", false, &payload()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .clone()
        .oneshot(json_request("PUT", "/products/a", false, &payload()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .clone()
        .oneshot(Request::delete("/products/a").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Nothing changed behind the 401s.
    let (_, listing) = get(&router, "/products").await;
    assert_eq!(listing["total"], 1);
}

#[tokio::test]
async fn invalid_inventory_payloads_are_rejected() {
    let router = test_app(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryAdmissionStore::new()),
    );

    let mut bad_category = payload();
    bad_category["category"] = serde_json::json!("Exhausts");

    let mut negative_price = payload();
    negative_price["price"] = serde_json::json!(-1.0);

    let mut blank_models = payload();
    blank_models["model"] = serde_json::json!(["", "  "]);

    for body in [bad_category, negative_price, blank_models] {
        let response = router
            .clone()
            .oneshot(json_request("POST", "/products", true, &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let (_, listing) = get(&router, "/products").await;
    assert_eq!(listing["total"], 0);
}

#[tokio::test]
async fn updating_a_missing_product_is_404() {
    let router = test_app(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryAdmissionStore::new()),
    );

    let response = router
        .clone()
        .oneshot(json_request("PUT", "/products/ghost", true, &payload()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Store stand-in for an unreachable backend.
struct DownStore;

#[async_trait]
impl CatalogStore for DownStore {
    async fn find(
        &self,
        _predicates: &[Predicate],
        _offset: usize,
        _limit: usize,
    ) -> Result<Vec<CatalogItem>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn count(&self, _predicates: &[Predicate]) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn get(&self, _id: &str) -> Result<Option<CatalogItem>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn insert(&self, _item: CatalogItem) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn update(&self, _item: CatalogItem) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn delete(&self, _id: &str) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn record_event(&self, _event: InterestEvent) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn events(&self) -> Result<Vec<InterestEvent>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn listing_fails_open_when_store_is_down() {
    let router = test_app(Arc::new(DownStore), Arc::new(MemoryAdmissionStore::new()));

    let (status, body) = get(&router, "/products?q=strut").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn admission_window_resets_after_elapse() {
    let store = MemoryAdmissionStore::with_limits(Duration::from_millis(50), 1);
    let router = test_app(Arc::new(MemoryStore::new()), Arc::new(store));

    let (status, _) = get(&router, "/products").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&router, "/products").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    tokio::time::sleep(Duration::from_millis(60)).await;
    let (status, _) = get(&router, "/products").await;
    assert_eq!(status, StatusCode::OK);
}
