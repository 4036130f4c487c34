//! HTTP API tests
//!
//! Serve the router over the in-memory store holding the sample shop:
//! userA (member 1) ordered items 2 and 3 in order 5, userB (member 8)
//! ordered items 9 and 10 in order 12.

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use core_kernel::ItemId;
use domain_order::InMemoryOrderStore;
use interface_api::config::{ApiConfig, StorageBackend};
use interface_api::{create_router, AppState};

async fn seeded_server() -> (TestServer, Arc<InMemoryOrderStore>) {
    let store = Arc::new(InMemoryOrderStore::seeded().await.unwrap());
    let config = ApiConfig {
        storage: StorageBackend::Memory,
        ..ApiConfig::default()
    };
    let server = TestServer::new(create_router(AppState::new(store.clone(), config))).unwrap();
    (server, store)
}

fn query_count(response: &axum_test::TestResponse) -> u32 {
    response
        .header("x-query-count")
        .to_str()
        .unwrap()
        .parse()
        .unwrap()
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let (server, _) = seeded_server().await;

        let response = server.get("/health").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "healthy");
    }

    #[tokio::test]
    async fn test_readiness_reports_store() {
        let (server, _) = seeded_server().await;

        let response = server.get("/health/ready").await;
        response.assert_status_ok();

        let body = response.json::<Value>();
        assert_eq!(body["status"], "ready");
        assert_eq!(body["storage"]["adapter_id"], "in-memory-order-store");
    }

    #[tokio::test]
    async fn test_request_id_is_generated_and_propagated() {
        let (server, _) = seeded_server().await;

        let response = server.get("/api/v4/simple-orders").await;
        let generated = response.header("x-request-id");
        assert!(uuid::Uuid::parse_str(generated.to_str().unwrap()).is_ok());

        let response = server
            .get("/api/v4/simple-orders")
            .add_header(
                HeaderName::from_static("x-request-id"),
                HeaderValue::from_static("client-supplied-id"),
            )
            .await;
        assert_eq!(response.header("x-request-id"), "client-supplied-id");
    }
}

mod simple_order_tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_counts() {
        let (server, _) = seeded_server().await;

        for (path, expected) in [
            ("/api/v1/simple-orders", 5),
            ("/api/v2/simple-orders", 5),
            ("/api/v3/simple-orders", 1),
            ("/api/v4/simple-orders", 1),
        ] {
            let response = server.get(path).await;
            response.assert_status_ok();
            assert_eq!(query_count(&response), expected, "{path}");
            assert_eq!(response.json::<Value>().as_array().unwrap().len(), 2, "{path}");
        }
    }

    #[tokio::test]
    async fn test_v1_renders_unloaded_lines_as_null() {
        let (server, _) = seeded_server().await;

        let body = server.get("/api/v1/simple-orders").await.json::<Value>();
        assert_eq!(body[0]["member"]["name"], "userA");
        assert!(body[0]["orderItems"].is_null());
    }

    #[tokio::test]
    async fn test_v1_filters() {
        let (server, _) = seeded_server().await;

        let response = server
            .get("/api/v1/simple-orders")
            .add_query_param("memberName", "userB")
            .await;
        assert_eq!(query_count(&response), 3);
        let body = response.json::<Value>();
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["member"]["name"], "userB");

        let response = server
            .get("/api/v1/simple-orders")
            .add_query_param("orderStatus", "CANCEL")
            .await;
        assert_eq!(query_count(&response), 1);
        assert!(response.json::<Value>().as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_summary_shape() {
        let (server, _) = seeded_server().await;

        let body = server.get("/api/v4/simple-orders").await.json::<Value>();
        let first = &body[0];
        assert_eq!(first["orderId"], 5);
        assert_eq!(first["name"], "userA");
        assert_eq!(first["orderStatus"], "ORDER");
        assert_eq!(first["address"]["city"], "Seoul");
        assert!(first["orderDate"].is_string());
    }
}

mod order_tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_counts() {
        let (server, _) = seeded_server().await;

        for (path, expected) in [
            ("/api/v1/orders", 11),
            ("/api/v2/orders", 11),
            ("/api/v3/orders", 1),
            ("/api/v3.1/orders", 3),
            ("/api/v4/orders", 3),
            ("/api/v5/orders", 2),
            ("/api/v6/orders", 1),
        ] {
            let response = server.get(path).await;
            response.assert_status_ok();
            assert_eq!(query_count(&response), expected, "{path}");
        }
    }

    #[tokio::test]
    async fn test_dto_strategies_agree() {
        let (server, _) = seeded_server().await;

        let expected = server.get("/api/v2/orders").await.json::<Value>();
        assert_eq!(expected[0]["orderItems"][1]["itemName"], "JPA2 BOOK");
        assert_eq!(expected[1]["orderItems"][0]["orderPrice"], 20000);

        for path in [
            "/api/v3/orders",
            "/api/v3.1/orders",
            "/api/v4/orders",
            "/api/v5/orders",
            "/api/v6/orders",
        ] {
            assert_eq!(server.get(path).await.json::<Value>(), expected, "{path}");
        }
    }

    #[tokio::test]
    async fn test_paging() {
        let (server, _) = seeded_server().await;

        let response = server
            .get("/api/v3.1/orders")
            .add_query_param("offset", 1)
            .add_query_param("limit", 1)
            .await;
        response.assert_status_ok();
        assert_eq!(query_count(&response), 3);

        let body = response.json::<Value>();
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "userB");

        let response = server
            .get("/api/v3.1/orders")
            .add_query_param("offset", 10)
            .await;
        assert_eq!(query_count(&response), 1);
        assert!(response.json::<Value>().as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_paging_is_rejected() {
        let (server, _) = seeded_server().await;

        let response = server
            .get("/api/v3.1/orders")
            .add_query_param("limit", 0)
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<Value>()["error"], "validation_error");

        let response = server
            .get("/api/v3.1/orders")
            .add_query_param("offset", -1)
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}

mod command_tests {
    use super::*;

    #[tokio::test]
    async fn test_place_order() {
        let (server, store) = seeded_server().await;

        let response = server
            .post("/api/orders")
            .json(&json!({ "memberId": 8, "items": [{ "itemId": 2, "count": 5 }] }))
            .await;
        response.assert_status(StatusCode::CREATED);
        assert!(response.json::<Value>()["orderId"].is_i64());

        assert_eq!(store.stock_of(ItemId::new(2)).await.unwrap(), 94);

        let orders = server.get("/api/v4/simple-orders").await.json::<Value>();
        assert_eq!(orders.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_place_order_without_stock() {
        let (server, store) = seeded_server().await;

        let response = server
            .post("/api/orders")
            .json(&json!({ "memberId": 1, "items": [{ "itemId": 2, "count": 1000 }] }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["error"], "conflict");

        assert_eq!(store.stock_of(ItemId::new(2)).await.unwrap(), 99);
    }

    #[tokio::test]
    async fn test_place_order_validation() {
        let (server, _) = seeded_server().await;

        let response = server
            .post("/api/orders")
            .json(&json!({ "memberId": 1, "items": [] }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let response = server
            .post("/api/orders")
            .json(&json!({ "memberId": 1, "items": [{ "itemId": 2, "count": 0 }] }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_place_order_for_unknown_member() {
        let (server, _) = seeded_server().await;

        let response = server
            .post("/api/orders")
            .json(&json!({ "memberId": 999, "items": [{ "itemId": 2, "count": 1 }] }))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cancel_order() {
        let (server, store) = seeded_server().await;

        server
            .post("/api/orders/5/cancel")
            .await
            .assert_status(StatusCode::NO_CONTENT);

        assert_eq!(store.stock_of(ItemId::new(2)).await.unwrap(), 100);
        assert_eq!(store.stock_of(ItemId::new(3)).await.unwrap(), 100);

        let cancelled = server
            .get("/api/v1/simple-orders")
            .add_query_param("orderStatus", "CANCEL")
            .await
            .json::<Value>();
        assert_eq!(cancelled[0]["id"], 5);
        assert_eq!(cancelled[0]["status"], "CANCEL");

        server
            .post("/api/orders/5/cancel")
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_cancel_delivered_order() {
        let (server, store) = seeded_server().await;
        store.complete_delivery(core_kernel::OrderId::new(12)).await.unwrap();

        let response = server.post("/api/orders/12/cancel").await;
        response.assert_status(StatusCode::CONFLICT);
        assert!(response.json::<Value>()["message"]
            .as_str()
            .unwrap()
            .contains("delivered"));
    }

    #[tokio::test]
    async fn test_cancel_unknown_order() {
        let (server, _) = seeded_server().await;

        let response = server.post("/api/orders/404/cancel").await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["error"], "not_found");
    }
}
