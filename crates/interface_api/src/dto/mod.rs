//! Request and response bodies

pub mod orders;

pub use orders::{OrderLineRequest, PageParams, PlaceOrderRequest, PlaceOrderResponse};
