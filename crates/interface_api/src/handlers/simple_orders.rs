//! Order summaries: the to-one associations only

use axum::extract::{Query, State};

use domain_order::{Order, OrderSearch, OrderSimpleDto, OrderSimpleQueryDto};

use super::Counted;
use crate::error::ApiError;
use crate::AppState;

/// V1: entities with member and delivery loaded one by one
///
/// Accepts `memberName` and `orderStatus` filters.
pub async fn simple_orders_v1(
    State(state): State<AppState>,
    Query(search): Query<OrderSearch>,
) -> Result<Counted<Order>, ApiError> {
    let fetched = state.queries.simple_order_entities(&search).await?;
    Ok(Counted::log("simple_orders_v1", fetched))
}

/// V2: DTOs from lazily loaded entities
pub async fn simple_orders_v2(
    State(state): State<AppState>,
) -> Result<Counted<OrderSimpleDto>, ApiError> {
    let fetched = state.queries.simple_orders_lazy().await?;
    Ok(Counted::log("simple_orders_v2", fetched))
}

/// V3: DTOs from a fetch join
pub async fn simple_orders_v3(
    State(state): State<AppState>,
) -> Result<Counted<OrderSimpleDto>, ApiError> {
    let fetched = state.queries.simple_orders_fetch_join().await?;
    Ok(Counted::log("simple_orders_v3", fetched))
}

/// V4: projection straight into DTOs
pub async fn simple_orders_v4(
    State(state): State<AppState>,
) -> Result<Counted<OrderSimpleQueryDto>, ApiError> {
    let fetched = state.queries.simple_orders_projection().await?;
    Ok(Counted::log("simple_orders_v4", fetched))
}
