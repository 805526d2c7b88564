//! Reduction of raw source items to display names

use std::collections::HashSet;

use serde_json::Value;

use crate::models::{RawItem, RawStock, StockSnapshot};

/// Display name of one raw item, trimmed
///
/// Bare strings are used as-is and entries contribute their `name`. Objects
/// that did not fit [`ItemEntry`](crate::models::ItemEntry) still contribute
/// their `name` field; without one they yield an empty name, as do `null`
/// and arrays.
pub fn normalize_item(item: &RawItem) -> String {
    match item {
        RawItem::Name(name) => name.trim().to_string(),
        RawItem::Entry(entry) => entry.name.trim().to_string(),
        RawItem::Other(Value::Object(map)) => {
            map.get("name").map(scalar_text).unwrap_or_default()
        }
        RawItem::Other(value) => scalar_text(value),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(_) | Value::Bool(_) => value.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Normalize a list: drop blanks, keep the first of each duplicate
pub fn normalize_items(items: &[RawItem]) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(normalize_item)
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Normalize every category of `stock` into a snapshot
pub fn normalize(stock: &RawStock, fetched_at: i64) -> StockSnapshot {
    let mut snapshot = StockSnapshot::new(fetched_at);
    for (category, items) in stock.iter() {
        snapshot.categories.insert(category, normalize_items(items));
    }
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, ItemEntry};
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_normalize_item_variants() {
        assert_eq!(normalize_item(&RawItem::from("  Carrot ")), "Carrot");

        let entry = ItemEntry {
            name: "Tomato (x3)".to_string(),
            quantity: Some(3),
            ..Default::default()
        };
        assert_eq!(normalize_item(&RawItem::from(entry)), "Tomato (x3)");

        assert_eq!(normalize_item(&RawItem::Other(json!(42))), "42");
        assert_eq!(normalize_item(&RawItem::Other(json!(null))), "");
        assert_eq!(normalize_item(&RawItem::Other(json!({"id": 1}))), "");
        assert_eq!(normalize_item(&RawItem::Other(json!(["a"]))), "");
    }

    #[test]
    fn test_normalize_structured_items_use_name() {
        let items: Vec<RawItem> = serde_json::from_value(json!([
            {"name": "Carrot", "quantity": "x5"},
            {"name": " Corn ", "quantity": 2.0},
            {"name": "Carrot", "quantity": -1},
            {"id": 4, "image_url": "https://example.com/4.png"},
            {"name": {"en": "Tomato"}},
        ]))
        .unwrap();

        assert!(matches!(items[0], RawItem::Other(_)));
        assert!(matches!(items[1], RawItem::Other(_)));
        assert_eq!(normalize_items(&items), vec!["Carrot", "Corn"]);
    }

    #[test]
    fn test_normalize_dedups_preserving_first() {
        let items = vec![
            RawItem::from("Carrot"),
            RawItem::from(" "),
            RawItem::from("Corn"),
            RawItem::from("Carrot "),
            RawItem::from("Apple"),
        ];
        assert_eq!(normalize_items(&items), vec!["Carrot", "Corn", "Apple"]);
    }

    #[test]
    fn test_normalize_fills_all_categories() {
        let mut stock = RawStock::empty();
        stock.push(Category::Eggs, "Bug Egg");

        let snapshot = normalize(&stock, 99);
        assert_eq!(snapshot.fetched_at, 99);
        assert_eq!(snapshot.categories.len(), 5);
        assert_eq!(snapshot.get(Category::Eggs), ["Bug Egg".to_string()]);
        assert!(snapshot.seeds().is_empty());
    }

    proptest! {
        #[test]
        fn prop_normalized_names_are_clean(names in prop::collection::vec("[ a-c]{0,4}", 0..20)) {
            let items: Vec<RawItem> = names.iter().map(|n| RawItem::Name(n.clone())).collect();
            let out = normalize_items(&items);

            let unique: HashSet<&String> = out.iter().collect();
            prop_assert_eq!(unique.len(), out.len());
            for name in &out {
                prop_assert!(!name.trim().is_empty());
                prop_assert_eq!(name.trim(), name.as_str());
            }
        }

        #[test]
        fn prop_order_follows_first_occurrence(names in prop::collection::vec("[a-d]{1,2}", 0..20)) {
            let items: Vec<RawItem> = names.iter().map(|n| RawItem::Name(n.clone())).collect();
            let out = normalize_items(&items);

            let mut expected: Vec<String> = Vec::new();
            for name in &names {
                if !expected.contains(name) {
                    expected.push(name.clone());
                }
            }
            prop_assert_eq!(out, expected);
        }
    }
}
