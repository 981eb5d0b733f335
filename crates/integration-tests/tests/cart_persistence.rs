//! The cart survives a restart through the file cache.

#![allow(clippy::unwrap_used)]

use std::fs;

use ecomfront_core::CartLine;
use ecomfront_integration_tests::{Harness, pid, product};
use ecomfront_storefront::cache::{CART_ITEMS_KEY, CartCache, FileCartCache};

#[test]
fn test_cart_restored_after_restart() {
    let harness = Harness::with_stock(&[("A1", 5), ("B2", 2)]);

    {
        let mut engine = harness.start_engine();
        engine.add_or_set_line(pid("A1"), 2, &product("Lamp", 500)).unwrap();
        engine.add_or_set_line(pid("B2"), 1, &product("Shade", 120)).unwrap();
        engine.increase_line(&pid("A1")).unwrap();
    }

    let engine = harness.start_engine();
    let quantities: Vec<(String, u32)> = engine
        .lines()
        .iter()
        .map(|l| (l.product_id.to_string(), l.quantity))
        .collect();
    assert_eq!(quantities, [("A1".to_string(), 3), ("B2".to_string(), 1)]);
}

#[test]
fn test_cache_file_is_a_json_line_array() {
    let harness = Harness::with_stock(&[("7", 5)]);
    let mut engine = harness.start_engine();
    engine.add_or_set_line(pid("7"), 2, &product("Lamp", 500)).unwrap();

    let raw = fs::read_to_string(harness.cache_dir.join(format!("{CART_ITEMS_KEY}.json"))).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json[0]["productId"], "7");
    assert_eq!(json[0]["quantity"], 2);
    assert_eq!(json[0]["productName"], "Lamp");
}

#[test]
fn test_numeric_ids_in_cache_are_accepted() {
    let harness = Harness::with_stock(&[("7", 5)]);
    fs::create_dir_all(&harness.cache_dir).unwrap();
    fs::write(
        harness.cache_dir.join(format!("{CART_ITEMS_KEY}.json")),
        r#"[{"productId":7,"productName":"Lamp","price":"650","specialPrice":"500","quantity":2}]"#,
    )
    .unwrap();

    let mut engine = harness.start_engine();
    assert_eq!(engine.line(&pid("7")).unwrap().quantity, 2);
    engine.increase_line(&pid("7")).unwrap();
    assert_eq!(engine.lines().len(), 1);
}

#[test]
fn test_corrupt_cache_starts_empty_and_recovers() {
    let harness = Harness::with_stock(&[("A1", 5)]);
    fs::create_dir_all(&harness.cache_dir).unwrap();
    fs::write(harness.cache_dir.join(format!("{CART_ITEMS_KEY}.json")), "{not json").unwrap();

    let mut engine = harness.start_engine();
    assert!(engine.is_empty());

    engine.add_or_set_line(pid("A1"), 1, &product("Lamp", 500)).unwrap();
    let reloaded: Vec<CartLine> = FileCartCache::new(&harness.cache_dir).load();
    assert_eq!(reloaded.len(), 1);
}

#[test]
fn test_removed_and_cleared_lines_stay_gone() {
    let harness = Harness::with_stock(&[("A1", 5), ("B2", 5)]);
    {
        let mut engine = harness.start_engine();
        engine.add_or_set_line(pid("A1"), 1, &product("Lamp", 500)).unwrap();
        engine.add_or_set_line(pid("B2"), 1, &product("Shade", 120)).unwrap();
        engine.remove_line(&pid("A1")).unwrap();
    }
    {
        let mut engine = harness.start_engine();
        assert!(engine.line(&pid("A1")).is_none());
        assert!(engine.line(&pid("B2")).is_some());
        engine.clear();
    }
    assert!(harness.start_engine().is_empty());
}
