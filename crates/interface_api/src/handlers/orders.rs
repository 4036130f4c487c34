//! Orders with their lines, plus placing and cancelling

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use validator::Validate;

use core_kernel::OrderId;
use domain_order::{Order, OrderDto, OrderQueryDto};

use super::Counted;
use crate::dto::{PageParams, PlaceOrderRequest, PlaceOrderResponse};
use crate::error::ApiError;
use crate::AppState;

// ============================================================================
// Fetch strategies
// ============================================================================

/// V1: entities with the whole graph loaded lazily
pub async fn orders_v1(State(state): State<AppState>) -> Result<Counted<Order>, ApiError> {
    let fetched = state.queries.order_entities().await?;
    Ok(Counted::log("orders_v1", fetched))
}

/// V2: DTOs from lazily loaded entities
pub async fn orders_v2(State(state): State<AppState>) -> Result<Counted<OrderDto>, ApiError> {
    let fetched = state.queries.orders_lazy().await?;
    Ok(Counted::log("orders_v2", fetched))
}

/// V3: one fetch join over every association, no paging
pub async fn orders_v3(State(state): State<AppState>) -> Result<Counted<OrderDto>, ApiError> {
    let fetched = state.queries.orders_fetch_join().await?;
    Ok(Counted::log("orders_v3", fetched))
}

/// V3.1: paged to-one fetch join with batched line loading
pub async fn orders_v3_1(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Counted<OrderDto>, ApiError> {
    params.validate()?;
    let fetched = state.queries.orders_paged_batch(params.to_page()).await?;
    Ok(Counted::log("orders_v3_1", fetched))
}

/// V4: projected roots, lines queried per order
pub async fn orders_v4(State(state): State<AppState>) -> Result<Counted<OrderQueryDto>, ApiError> {
    let fetched = state.queries.orders_projection_per_order().await?;
    Ok(Counted::log("orders_v4", fetched))
}

/// V5: projected roots, lines in one `IN` query
pub async fn orders_v5(State(state): State<AppState>) -> Result<Counted<OrderQueryDto>, ApiError> {
    let fetched = state.queries.orders_projection_batched().await?;
    Ok(Counted::log("orders_v5", fetched))
}

/// V6: one flat projection regrouped in memory
pub async fn orders_v6(State(state): State<AppState>) -> Result<Counted<OrderQueryDto>, ApiError> {
    let fetched = state.queries.orders_projection_flat().await?;
    Ok(Counted::log("orders_v6", fetched))
}

// ============================================================================
// Commands
// ============================================================================

/// Places an order
pub async fn place_order(
    State(state): State<AppState>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<PlaceOrderResponse>), ApiError> {
    request.validate()?;

    let order_id = state
        .orders
        .order(request.member_id, &request.lines())
        .await?;

    info!(%order_id, member_id = %request.member_id, "Order created via API");
    Ok((StatusCode::CREATED, Json(PlaceOrderResponse { order_id })))
}

/// Cancels an order
pub async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let order_id = OrderId::new(id);
    state.orders.cancel_order(order_id).await?;

    info!(%order_id, "Order cancelled via API");
    Ok(StatusCode::NO_CONTENT)
}
