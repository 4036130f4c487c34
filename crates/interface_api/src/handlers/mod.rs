//! Request handlers
//!
//! Fetch strategy handlers answer with the JSON body and an `x-query-count`
//! header holding the number of store round-trips the strategy issued.

pub mod health;
pub mod orders;
pub mod simple_orders;

use axum::{
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::info;

use domain_order::Fetched;

/// Response header with the round-trip count of a fetch strategy
pub const QUERY_COUNT_HEADER: HeaderName = HeaderName::from_static("x-query-count");

/// A fetched list rendered as JSON with its round-trip count in a header
#[derive(Debug)]
pub struct Counted<T>(pub Fetched<Vec<T>>);

impl<T> Counted<T> {
    /// Logs the strategy's cost and wraps the result
    pub fn log(strategy: &'static str, fetched: Fetched<Vec<T>>) -> Self {
        info!(
            strategy,
            round_trips = fetched.round_trips,
            results = fetched.value.len(),
            "Orders fetched"
        );
        Self(fetched)
    }
}

impl<T: Serialize> IntoResponse for Counted<T> {
    fn into_response(self) -> Response {
        let Fetched { value, round_trips } = self.0;
        let mut response = Json(value).into_response();
        response
            .headers_mut()
            .insert(QUERY_COUNT_HEADER, HeaderValue::from(round_trips));
        response
    }
}
