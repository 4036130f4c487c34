//! Order DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{ItemId, MemberId, OrderId};
use domain_order::{LineRequest, Page};

/// Query parameters for the paged strategy
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct PageParams {
    #[serde(default)]
    #[validate(range(min = 0, message = "offset must not be negative"))]
    pub offset: i64,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 1000, message = "limit must be between 1 and 1000"))]
    pub limit: i64,
}

fn default_limit() -> i64 {
    i64::from(Page::DEFAULT_LIMIT)
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: default_limit(),
        }
    }
}

impl PageParams {
    /// Converts validated parameters into a page window
    pub fn to_page(self) -> Page {
        Page::new(
            u32::try_from(self.offset).unwrap_or(u32::MAX),
            u32::try_from(self.limit).unwrap_or(Page::DEFAULT_LIMIT),
        )
    }
}

/// One line of a new order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub item_id: ItemId,
    #[validate(range(min = 1, message = "count must be positive"))]
    pub count: i32,
}

impl From<OrderLineRequest> for LineRequest {
    fn from(line: OrderLineRequest) -> Self {
        LineRequest {
            item_id: line.item_id,
            count: line.count,
        }
    }
}

/// Body of `POST /api/orders`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub member_id: MemberId,
    #[validate(length(min = 1, message = "an order needs at least one item"), nested)]
    pub items: Vec<OrderLineRequest>,
}

impl PlaceOrderRequest {
    pub fn lines(&self) -> Vec<LineRequest> {
        self.items.iter().copied().map(LineRequest::from).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    pub order_id: OrderId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_bounds() {
        assert!(PageParams::default().validate().is_ok());
        assert!(PageParams { offset: -1, limit: 10 }.validate().is_err());
        assert!(PageParams { offset: 0, limit: 0 }.validate().is_err());
        assert!(PageParams { offset: 0, limit: 1001 }.validate().is_err());
        assert_eq!(
            PageParams { offset: 1, limit: 1 }.to_page(),
            Page::new(1, 1)
        );
    }

    #[test]
    fn test_place_order_request_validation() {
        let request: PlaceOrderRequest = serde_json::from_value(serde_json::json!({
            "memberId": 1,
            "items": [{ "itemId": 2, "count": 3 }]
        }))
        .unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.lines()[0].item_id, ItemId::new(2));

        let empty = PlaceOrderRequest {
            member_id: MemberId::new(1),
            items: Vec::new(),
        };
        assert!(empty.validate().is_err());

        let zero = PlaceOrderRequest {
            member_id: MemberId::new(1),
            items: vec![OrderLineRequest {
                item_id: ItemId::new(2),
                count: 0,
            }],
        };
        assert!(zero.validate().is_err());
    }
}
