//! PostgreSQL adapter integration tests
//!
//! Each test starts its own PostgreSQL container, so they are ignored unless
//! run with `--ignored` on a machine with Docker.

use std::sync::Arc;

use core_kernel::{AdapterHealth, HealthCheckable, ItemId, OrderId};
use domain_order::{
    seed_sample_data, ItemDraft, LineRequest, MemberDraft, OrderError, OrderPort,
    OrderQueryService, OrderSearch, OrderStatus, Page,
};
use infra_db::{DatabaseError, PostgresOrderAdapter};
use sqlx::PgPool;
use test_utils::{db_test, ShopFixtures};

async fn seeded(pool: &PgPool) -> Arc<PostgresOrderAdapter> {
    let adapter = Arc::new(PostgresOrderAdapter::new(pool.clone()));
    assert!(seed_sample_data(adapter.as_ref()).await.unwrap());
    adapter
}

async fn stock_of(adapter: &PostgresOrderAdapter, item_id: ItemId) -> i32 {
    adapter.find_item(item_id).await.unwrap().stock_quantity
}

db_test!(test_seed_is_idempotent, |pool| {
    let adapter = seeded(&pool).await;
    assert!(!seed_sample_data(adapter.as_ref()).await.unwrap());

    let orders = adapter.find_orders(&OrderSearch::default()).await.unwrap();
    assert_eq!(orders.len(), 2);
});

db_test!(test_round_trips_match_in_memory_store, |pool| {
    let adapter = seeded(&pool).await;
    let service = OrderQueryService::new(adapter.clone(), adapter);

    assert_eq!(service.simple_orders_lazy().await.unwrap().round_trips, 5);
    assert_eq!(service.simple_orders_fetch_join().await.unwrap().round_trips, 1);
    assert_eq!(service.orders_lazy().await.unwrap().round_trips, 11);
    assert_eq!(service.orders_fetch_join().await.unwrap().round_trips, 1);
    assert_eq!(
        service.orders_paged_batch(Page::default()).await.unwrap().round_trips,
        3
    );
    assert_eq!(service.orders_projection_per_order().await.unwrap().round_trips, 3);
    assert_eq!(service.orders_projection_batched().await.unwrap().round_trips, 2);
    assert_eq!(service.orders_projection_flat().await.unwrap().round_trips, 1);
});

db_test!(test_strategies_return_same_orders, |pool| {
    let adapter = seeded(&pool).await;
    let service = OrderQueryService::new(adapter.clone(), adapter);

    let lazy = serde_json::to_value(service.orders_lazy().await.unwrap().value).unwrap();
    let joined = serde_json::to_value(service.orders_fetch_join().await.unwrap().value).unwrap();
    let flat = serde_json::to_value(service.orders_projection_flat().await.unwrap().value).unwrap();

    assert_eq!(lazy, joined);
    assert_eq!(lazy, flat);
    assert_eq!(lazy[1]["orderItems"][1]["itemName"], "SPRING2 BOOK");
});

db_test!(test_fetch_join_yields_each_order_once, |pool| {
    let adapter = seeded(&pool).await;
    let orders = adapter.find_orders_with_items().await.unwrap();

    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].order_items.get().unwrap().len(), 2);
});

db_test!(test_paging_window, |pool| {
    let adapter = seeded(&pool).await;
    let page = adapter
        .find_orders_with_member_delivery(Some(Page::new(1, 1)))
        .await
        .unwrap();

    assert_eq!(page.len(), 1);
    assert_eq!(page[0].member.get().unwrap().name, "userB");
});

db_test!(test_search_by_name_and_status, |pool| {
    let adapter = seeded(&pool).await;

    let by_name = adapter
        .find_orders(&OrderSearch::by_member_name("erA"))
        .await
        .unwrap();
    assert_eq!(by_name.len(), 1);

    let wildcard = adapter
        .find_orders(&OrderSearch::by_member_name("user_"))
        .await
        .unwrap();
    assert!(wildcard.is_empty());

    let cancelled = adapter
        .find_orders(&OrderSearch::by_status(OrderStatus::Cancel))
        .await
        .unwrap();
    assert!(cancelled.is_empty());
});

db_test!(test_place_and_cancel_order, |pool| {
    let adapter = PostgresOrderAdapter::new(pool.clone());
    let member_id = adapter
        .join_member(MemberDraft::new("userA", ShopFixtures::seoul()))
        .await
        .unwrap();
    let item_id = adapter
        .register_item(ItemDraft::book("JPA1 BOOK", 10000, 10))
        .await
        .unwrap();

    let order_id = adapter
        .place_order(member_id, &[LineRequest { item_id, count: 3 }])
        .await
        .unwrap();
    assert_eq!(stock_of(&adapter, item_id).await, 7);

    adapter.cancel_order(order_id).await.unwrap();
    assert_eq!(stock_of(&adapter, item_id).await, 10);

    let order = adapter.find_order_graph(order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancel);

    let again = adapter.cancel_order(order_id).await.unwrap_err();
    assert!(matches!(again, OrderError::AlreadyCancelled(_)));
});

db_test!(test_not_enough_stock_leaves_nothing_behind, |pool| {
    let adapter = PostgresOrderAdapter::new(pool.clone());
    let member_id = adapter
        .join_member(MemberDraft::new("userA", ShopFixtures::seoul()))
        .await
        .unwrap();
    let item_id = adapter
        .register_item(ItemDraft::book("JPA1 BOOK", 10000, 2))
        .await
        .unwrap();

    let err = adapter
        .place_order(member_id, &[LineRequest { item_id, count: 3 }])
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::NotEnoughStock { available: 2, .. }));
    assert_eq!(stock_of(&adapter, item_id).await, 2);
    assert!(adapter
        .find_orders(&OrderSearch::default())
        .await
        .unwrap()
        .is_empty());
});

db_test!(test_cancel_delivered_order_rejected, |pool| {
    let adapter = seeded(&pool).await;
    let order_id: OrderId = adapter
        .find_orders(&OrderSearch::default())
        .await
        .unwrap()[0]
        .id;
    sqlx::query(
        "UPDATE deliveries SET status = 'COMP' \
         WHERE delivery_id = (SELECT delivery_id FROM orders WHERE order_id = $1)",
    )
    .bind(order_id.value())
    .execute(&pool)
    .await
    .unwrap();

    let err = adapter.cancel_order(order_id).await.unwrap_err();
    assert!(matches!(err, OrderError::AlreadyDelivered(_)));
});

db_test!(test_cancel_rejected_when_delivery_completes_first, |pool| {
    let adapter = seeded(&pool).await;
    let order = adapter.find_orders(&OrderSearch::default()).await.unwrap()[0].clone();
    let graph = adapter.find_order_graph(order.id).await.unwrap();
    let line = &graph.order_items.get().unwrap()[0];
    let stock_before = stock_of(&adapter, line.item_id).await;

    sqlx::query("UPDATE deliveries SET status = 'COMP' WHERE delivery_id = $1")
        .bind(order.delivery_id.value())
        .execute(&pool)
        .await
        .unwrap();

    let err = adapter
        .repository()
        .cancel_order(order.id.value(), &[(line.item_id.value(), line.count)])
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::ConcurrentUpdate(_)));

    assert_eq!(stock_of(&adapter, line.item_id).await, stock_before);
    let status: String = sqlx::query_scalar("SELECT status FROM orders WHERE order_id = $1")
        .bind(order.id.value())
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "ORDER");
});

db_test!(test_missing_order_is_not_found, |pool| {
    let adapter = PostgresOrderAdapter::new(pool.clone());
    let err = adapter.find_order_graph(OrderId::new(404)).await.unwrap_err();
    assert!(err.is_not_found());
});

db_test!(test_health_check_healthy, |pool| {
    let adapter = PostgresOrderAdapter::new(pool.clone());
    let health = adapter.health_check().await;
    assert_eq!(health.status, AdapterHealth::Healthy);
});
