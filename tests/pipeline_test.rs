//! Snapshot pipeline tests with in-memory sources

mod common;

use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

use stockwatch::failover::FailoverState;
use stockwatch::models::{Category, ItemEntry, RawItem, RawStock, SourceKind};
use stockwatch::pipeline::{normalize, SnapshotPipeline};
use stockwatch::storage::StateStore;

use common::{controller_with_state, MockProbe, StaticSource};

const T0: i64 = 1_718_000_000;

fn scraped_stock() -> RawStock {
    let mut stock = RawStock::empty();
    stock.push(
        Category::Seeds,
        ItemEntry {
            name: "Carrot (x12)".into(),
            quantity: Some(12),
            ..Default::default()
        },
    );
    stock.push(Category::Gears, "Trowel (x1)");
    stock.push(Category::Weather, "Thunderstorm - Most Recent");
    stock
}

fn api_stock() -> RawStock {
    let mut stock = RawStock::empty();
    stock.set(
        Category::Seeds,
        vec!["Corn".into(), RawItem::Other(json!(null)), "Corn".into()],
    );
    stock.set(Category::Eggs, vec!["Common Egg".into()]);
    stock.set(Category::EventShop, vec!["Bee Egg".into()]);
    stock
}

fn pipeline(
    primary: Arc<StaticSource>,
    secondary: Arc<StaticSource>,
    state: FailoverState,
) -> (TempDir, SnapshotPipeline) {
    let dir = TempDir::new().unwrap();
    let store = StateStore::new(dir.path().join("bot_cache.json"));
    let controller = Arc::new(controller_with_state(state, store, MockProbe::new(true)));
    (dir, SnapshotPipeline::new(primary, secondary, controller))
}

#[tokio::test]
async fn test_primary_mode_reads_primary() {
    let primary = StaticSource::new(SourceKind::Primary, scraped_stock());
    let secondary = StaticSource::new(SourceKind::Secondary, api_stock());
    let (_dir, pipeline) = pipeline(primary.clone(), secondary.clone(), FailoverState::default());

    let (source, snapshot) = pipeline.fetch_all_at(T0).await;

    assert_eq!(source, SourceKind::Primary);
    assert_eq!(snapshot.seeds(), ["Carrot (x12)"]);
    assert_eq!(snapshot.fetched_at, T0);
    assert_eq!(primary.fetches(), 1);
    assert_eq!(secondary.fetches(), 0);
}

#[tokio::test]
async fn test_empty_primary_falls_back_for_one_cycle() {
    let primary = StaticSource::new(SourceKind::Primary, RawStock::empty());
    let secondary = StaticSource::new(SourceKind::Secondary, api_stock());
    let (_dir, pipeline) = pipeline(primary.clone(), secondary.clone(), FailoverState::default());

    let report = pipeline.run_cycle_at(T0).await;

    assert_eq!(report.source, SourceKind::Secondary);
    assert_eq!(report.snapshot.seeds(), ["Corn"]);
    assert!(report.outcome.fresh);
    assert!(report.outcome.transition.is_none());
    assert_eq!(
        pipeline.controller().mode().await,
        SourceKind::Primary,
        "A one-cycle fallback must not flip persisted state"
    );
    assert_eq!(primary.fetches(), 1);
    assert_eq!(secondary.fetches(), 1);
}

#[tokio::test]
async fn test_fallback_mode_reads_secondary_only() {
    let primary = StaticSource::new(SourceKind::Primary, scraped_stock());
    let secondary = StaticSource::new(SourceKind::Secondary, api_stock());
    let state = FailoverState {
        using_fallback: true,
        switch_time: Some(T0),
        ..Default::default()
    };
    let (_dir, pipeline) = pipeline(primary.clone(), secondary.clone(), state);

    let (source, snapshot) = pipeline.fetch_all_at(T0 + 60).await;

    assert_eq!(source, SourceKind::Secondary);
    assert!(snapshot.get(Category::Weather).is_empty());
    assert_eq!(primary.fetches(), 0);
}

#[tokio::test]
async fn test_run_cycle_reports_repeats() {
    let primary = StaticSource::new(SourceKind::Primary, scraped_stock());
    let secondary = StaticSource::new(SourceKind::Secondary, api_stock());
    let (_dir, pipeline) = pipeline(primary, secondary, FailoverState::default());

    let first = pipeline.run_cycle_at(T0).await;
    assert!(first.is_actionable());

    let second = pipeline.run_cycle_at(T0 + 300).await;
    assert!(!second.outcome.fresh);
    assert_eq!(second.outcome.repeated_count, 1);
    assert!(!second.is_actionable());
}

#[tokio::test]
async fn test_consumer_view_has_four_keys() {
    let primary = StaticSource::new(SourceKind::Primary, scraped_stock());
    let secondary = StaticSource::new(SourceKind::Secondary, api_stock());
    let (_dir, pipeline) = pipeline(primary, secondary, FailoverState::default());

    let view = pipeline.fetch_all().await.consumer_view();
    let keys: Vec<&str> = view.keys().copied().collect();

    assert_eq!(keys, vec!["egg", "gear", "seeds", "weather"]);
    assert_eq!(view["gear"], vec!["Trowel (x1)"]);
    assert_eq!(view["weather"], vec!["Thunderstorm - Most Recent"]);
}

fn raw_item() -> impl Strategy<Value = RawItem> {
    prop_oneof![
        "[ a-zA-Z]{0,8}".prop_map(RawItem::Name),
        "[ a-zA-Z]{0,8}".prop_map(|name| RawItem::Entry(ItemEntry {
            name,
            ..Default::default()
        })),
        any::<i32>().prop_map(|n| RawItem::Other(json!(n))),
        Just(RawItem::Other(json!(null))),
    ]
}

proptest! {
    #[test]
    fn prop_consumer_view_is_clean(
        seeds in prop::collection::vec(raw_item(), 0..12),
        gear in prop::collection::vec(raw_item(), 0..12),
        weather in prop::collection::vec(raw_item(), 0..4),
    ) {
        let mut stock = RawStock::empty();
        stock.set(Category::Seeds, seeds);
        stock.set(Category::Gears, gear);
        stock.set(Category::Weather, weather);

        let view = normalize(&stock, T0).consumer_view();
        prop_assert_eq!(view.len(), 4);

        for names in view.values() {
            let mut seen = std::collections::HashSet::new();
            for name in names {
                prop_assert!(!name.trim().is_empty());
                prop_assert_eq!(name.trim(), name.as_str());
                prop_assert!(seen.insert(name.clone()), "duplicate {}", name);
            }
        }
    }
}
