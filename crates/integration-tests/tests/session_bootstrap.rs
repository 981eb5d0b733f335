//! A guest cart is pushed to the server cart at sign-in, then replicated.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use ecomfront_core::CartId;
use ecomfront_integration_tests::{Harness, pid, product};
use ecomfront_storefront::remote::RemoteCall;

#[tokio::test]
async fn test_guest_cart_merged_at_sign_in() {
    let harness = Harness::with_stock(&[("A1", 5), ("S1", 5)]);
    harness
        .backend
        .set_server_cart(vec![product("Saved", 90).to_line(pid("S1"), 1)], Some(CartId::new(12)));

    let mut engine = harness.start_engine();
    engine.add_or_set_line(pid("A1"), 2, &product("Lamp", 500)).unwrap();
    engine.flush_replication().await;
    assert_eq!(harness.backend.call_count(), 0);

    engine
        .bootstrap_session(Arc::new(harness.backend.clone()))
        .await
        .unwrap();

    assert_eq!(engine.server_cart_id(), Some(CartId::new(12)));
    assert_eq!(engine.item_count(), 3);

    // The hydrated cart is what a restart sees
    let restarted = harness.start_engine();
    assert_eq!(restarted.lines(), engine.lines());
}

#[tokio::test]
async fn test_changes_after_sign_in_reach_server_cart() {
    let harness = Harness::with_stock(&[("A1", 5)]);
    let mut engine = harness.start_engine();
    engine.add_or_set_line(pid("A1"), 1, &product("Lamp", 500)).unwrap();
    engine
        .bootstrap_session(Arc::new(harness.backend.clone()))
        .await
        .unwrap();

    engine.increase_line(&pid("A1")).unwrap();
    engine.increase_line(&pid("A1")).unwrap();
    engine.flush_replication().await;
    assert_eq!(harness.backend.server_cart().products[0].quantity, 3);

    engine.remove_line(&pid("A1")).unwrap();
    engine.flush_replication().await;
    assert!(harness.backend.server_cart().products.is_empty());
    assert!(harness.backend.calls().contains(&RemoteCall::RemoveProduct {
        cart_id: CartId::new(1),
        product_id: pid("A1"),
    }));
}

#[tokio::test]
async fn test_backend_outage_never_loses_local_changes() {
    let harness = Harness::with_stock(&[("A1", 5)]);
    let mut engine = harness.start_engine();
    engine
        .bootstrap_session(Arc::new(harness.backend.clone()))
        .await
        .unwrap_err();

    harness.backend.set_fail_requests(true);
    engine.add_or_set_line(pid("A1"), 4, &product("Lamp", 500)).unwrap();
    engine.decrease_line(&pid("A1")).unwrap();
    engine.flush_replication().await;

    assert_eq!(engine.line(&pid("A1")).unwrap().quantity, 3);
    assert_eq!(harness.start_engine().item_count(), 3);
}

#[tokio::test]
async fn test_catalog_refresh_tightens_stock_ceiling() {
    let harness = Harness::with_stock(&[("A1", 5)]);
    let mut engine = harness.start_engine();
    engine.add_or_set_line(pid("A1"), 2, &product("Lamp", 500)).unwrap();

    harness.backend.set_stock("A1", 2);
    assert!(harness.refresh_catalog().await);

    assert!(engine.increase_line(&pid("A1")).is_err());
    engine.decrease_line(&pid("A1")).unwrap();
    assert_eq!(engine.line(&pid("A1")).unwrap().quantity, 1);
}
