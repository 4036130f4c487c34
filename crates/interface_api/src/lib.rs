//! HTTP API Layer
//!
//! This crate exposes the order fetch strategies over REST using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: one per fetch strategy, plus order commands and health
//! - **Middleware**: request ids, request logging, tracing
//! - **DTOs**: request bodies and query parameters
//! - **Error Handling**: consistent JSON error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let store = Arc::new(InMemoryOrderStore::seeded().await?);
//! let app = create_router(AppState::new(store, config));
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use core_kernel::HealthCheckable;
use domain_order::{OrderPort, OrderQueryPort, OrderQueryService, OrderService};

use crate::config::ApiConfig;
use crate::handlers::{health, orders, simple_orders};
use crate::middleware::{request_logging_middleware, MakeRequestUuidV7, REQUEST_ID_HEADER};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub queries: OrderQueryService,
    pub orders: OrderService,
    pub health: Arc<dyn HealthCheckable>,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires the services over one store that serves both ports
    pub fn new<S>(store: Arc<S>, config: ApiConfig) -> Self
    where
        S: OrderPort + OrderQueryPort,
    {
        let queries = OrderQueryService::new(store.clone(), store.clone())
            .with_batch_fetch_size(config.default_batch_fetch_size);
        let orders = OrderService::new(store.clone());

        Self {
            queries,
            orders,
            health: store,
            config,
        }
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `state` - Services and configuration shared by the handlers
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // To-one associations only
    let simple_order_routes = Router::new()
        .route("/v1/simple-orders", get(simple_orders::simple_orders_v1))
        .route("/v2/simple-orders", get(simple_orders::simple_orders_v2))
        .route("/v3/simple-orders", get(simple_orders::simple_orders_v3))
        .route("/v4/simple-orders", get(simple_orders::simple_orders_v4));

    // With the order line collection
    let order_routes = Router::new()
        .route("/v1/orders", get(orders::orders_v1))
        .route("/v2/orders", get(orders::orders_v2))
        .route("/v3/orders", get(orders::orders_v3))
        .route("/v3.1/orders", get(orders::orders_v3_1))
        .route("/v4/orders", get(orders::orders_v4))
        .route("/v5/orders", get(orders::orders_v5))
        .route("/v6/orders", get(orders::orders_v6));

    let command_routes = Router::new()
        .route("/orders", post(orders::place_order))
        .route("/orders/:id/cancel", post(orders::cancel_order));

    let api_routes = Router::new()
        .merge(simple_order_routes)
        .merge(order_routes)
        .merge(command_routes)
        .route_layer(axum_middleware::from_fn(request_logging_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuidV7))
                .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER)),
        )
        .with_state(state)
}
