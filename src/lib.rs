//! Backend for a spare-parts storefront: catalog browsing with filtering
//! and pagination, interest-click tracking, and an admin dashboard with a
//! top-products leaderboard.
//!
//! # Request flow
//!
//! Every inbound request passes the admission gate first (per-client
//! fixed-window counter, 429 past the limit, static assets exempt). Allowed
//! catalog requests have their query parameters compiled into predicates,
//! the store executes them and returns matches plus a count, and the
//! paginator turns the count into offset and page links that keep the
//! active filters. The dashboard independently aggregates the click history
//! into a top-5 leaderboard.
//!
//! # Collaborators
//!
//! Persistent storage sits behind the [`store::CatalogStore`] trait and is
//! consumed purely as "find matching / count matching / fetch events".
//! Admin authorization is the [`auth::is_admin`] capability. Rate-limit
//! state is per process instance by design; see `admission`.

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    middleware::from_fn_with_state,
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod admission;
pub mod auth;
pub mod config;
pub mod error;
pub mod filters;
pub mod models;
pub mod pagination;
pub mod ranking;
pub mod routes;
pub mod state;
pub mod store;

use admission::admission_gate;
use routes::{
    create_product, dashboard, delete_product, get_product, list_products, track_event,
    update_product,
};
use state::AppState;

/// Builds the full router, admission gate included.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/events", post(track_event))
        .route("/dashboard", get(dashboard))
        .layer(from_fn_with_state(state.clone(), admission_gate))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new();

    info!("Starting server...");
    let address = format!("0.0.0.0:{}", state.config.port);
    let router = app(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
