use std::sync::Arc;

use common::{CustomerId, Money, ProductId};
use fulfillment::{FulfillmentError, LineRequest, OrderAssembler, PlaceOrder};
use domain::ShippingAddress;
use store::{InMemoryStore, Product};

fn address() -> ShippingAddress {
    ShippingAddress::new("1 Main St", "Springfield", "IL", "62701", "US")
}

fn assembler_over(
    store: &InMemoryStore,
) -> Arc<OrderAssembler<InMemoryStore, InMemoryStore, InMemoryStore>> {
    Arc::new(OrderAssembler::new(
        store.clone(),
        store.clone(),
        store.clone(),
    ))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_placements_never_oversell() {
    let store = InMemoryStore::new();
    store
        .add_product(Product::new("SKU-HOT", "Limited Run", Money::from_cents(9900), 5))
        .await;
    let assembler = assembler_over(&store);

    // Ten buyers race for five units, two apiece. Exactly two can win.
    let mut handles = Vec::new();
    for _ in 0..10 {
        let assembler = Arc::clone(&assembler);
        handles.push(tokio::spawn(async move {
            assembler
                .place_order(PlaceOrder::new(
                    CustomerId::new(),
                    vec![LineRequest::new("SKU-HOT", 2)],
                    address(),
                    "card",
                ))
                .await
        }));
    }

    let mut placed = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(FulfillmentError::InsufficientStock { .. }) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(placed, 2);
    assert_eq!(rejected, 8);
    assert_eq!(store.stock_of(&ProductId::new("SKU-HOT")).await, Some(1));
    assert_eq!(store.order_count().await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_buyers_race_for_five_units() {
    let store = InMemoryStore::new();
    store
        .add_product(Product::new("SKU-P", "Popular", Money::from_cents(1200), 5))
        .await;
    let assembler = assembler_over(&store);

    let first = {
        let assembler = Arc::clone(&assembler);
        tokio::spawn(async move {
            assembler
                .place_order(PlaceOrder::new(
                    CustomerId::new(),
                    vec![LineRequest::new("SKU-P", 3)],
                    address(),
                    "card",
                ))
                .await
        })
    };
    let second = {
        let assembler = Arc::clone(&assembler);
        tokio::spawn(async move {
            assembler
                .place_order(PlaceOrder::new(
                    CustomerId::new(),
                    vec![LineRequest::new("SKU-P", 3)],
                    address(),
                    "card",
                ))
                .await
        })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(FulfillmentError::InsufficientStock { requested: 3, .. })
    )));
    assert_eq!(store.stock_of(&ProductId::new("SKU-P")).await, Some(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_placements_get_distinct_order_numbers() {
    let store = InMemoryStore::new();
    store
        .add_product(Product::new("SKU-BULK", "Bulk Item", Money::from_cents(100), 10_000))
        .await;
    let assembler = assembler_over(&store);

    let mut handles = Vec::new();
    for _ in 0..50 {
        let assembler = Arc::clone(&assembler);
        handles.push(tokio::spawn(async move {
            assembler
                .place_order(PlaceOrder::new(
                    CustomerId::new(),
                    vec![LineRequest::new("SKU-BULK", 1)],
                    address(),
                    "card",
                ))
                .await
                .unwrap()
        }));
    }

    let mut numbers = std::collections::HashSet::new();
    for handle in handles {
        let order = handle.await.unwrap();
        assert!(numbers.insert(order.order_number().as_str().to_string()));
    }
    assert_eq!(numbers.len(), 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_cancellations_release_stock_once() {
    let store = InMemoryStore::new();
    store
        .add_product(Product::new("SKU-C", "Cancellable", Money::from_cents(300), 50))
        .await;
    let assembler = assembler_over(&store);

    for _ in 0..100 {
        let order = assembler
            .place_order(PlaceOrder::new(
                CustomerId::new(),
                vec![LineRequest::new("SKU-C", 5)],
                address(),
                "card",
            ))
            .await
            .unwrap();

        let barrier = Arc::new(tokio::sync::Barrier::new(4));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let assembler = Arc::clone(&assembler);
            let barrier = Arc::clone(&barrier);
            let order_id = order.id();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                assembler.cancel_order(order_id).await
            }));
        }

        let mut cancelled = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => cancelled += 1,
                Err(FulfillmentError::Order(_)) | Err(FulfillmentError::UpdateConflict(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        // Exactly one winner per round; stock back to where it started.
        assert_eq!(cancelled, 1);
        assert_eq!(store.stock_of(&ProductId::new("SKU-C")).await, Some(50));
    }
}

#[tokio::test]
async fn order_totals_survive_catalog_price_changes() {
    let store = InMemoryStore::new();
    store
        .add_product(Product::new("SKU-VAR", "Repriced", Money::from_cents(500), 10))
        .await;
    let assembler = assembler_over(&store);

    let order = assembler
        .place_order(PlaceOrder::new(
            CustomerId::new(),
            vec![LineRequest::new("SKU-VAR", 3)],
            address(),
            "card",
        ))
        .await
        .unwrap();
    assert_eq!(order.total().cents(), 1500);

    // Catalog doubles the price after the sale.
    store
        .add_product(Product::new("SKU-VAR", "Repriced", Money::from_cents(1000), 7))
        .await;

    let loaded = assembler.get_order(order.id()).await.unwrap().unwrap();
    assert_eq!(loaded.total().cents(), 1500);
    assert_eq!(loaded.line_items()[0].unit_price, Money::from_cents(500));
}
