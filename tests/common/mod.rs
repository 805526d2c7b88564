//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use stockwatch::config::FailoverConfig;
use stockwatch::failover::{FailoverController, FailoverState, PrimaryProbe};
use stockwatch::models::{Category, RawStock, SourceKind, StockSnapshot};
use stockwatch::notify::{Notifier, NotifyError, StockEvent};
use stockwatch::sources::StockSource;
use stockwatch::storage::StateStore;

/// Stock page with every known section plus an ignored cosmetics section
pub const STOCK_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Grow a Garden Stock</title></head>
<body>
  <section class="stock-section" id="seeds-section">
    <div class="stock-item">
      <img src="/img/carrot.png">
      <div class="item-name">Carrot</div>
      <div class="item-quantity">x12</div>
    </div>
    <div class="stock-item">
      <div class="item-name">  Strawberry </div>
      <div class="item-quantity">x3</div>
    </div>
    <div class="stock-item">
      <div class="item-quantity">x9</div>
    </div>
  </section>
  <section class="stock-section" id="gears-section">
    <div class="stock-item">
      <div class="item-name">Watering Can</div>
      <div class="item-quantity">lots</div>
    </div>
  </section>
  <section class="stock-section" id="eggs-section">
    <div class="stock-item">
      <div class="item-name">Common Egg</div>
      <div class="item-quantity">x1</div>
    </div>
  </section>
  <section class="stock-section" id="weather-section">
    <div class="stock-item">
      <span style="font-size: 2em">⚡</span>
      <div class="item-name">Thunderstorm</div>
      <div class="item-quantity">Most Recent</div>
    </div>
  </section>
  <section class="stock-section" id="cosmetics-section">
    <div class="stock-item">
      <div class="item-name">Garden Gnome</div>
      <div class="item-quantity">x1</div>
    </div>
  </section>
</body>
</html>"#;

/// A page that loads fine but has no stock markup
pub const MAINTENANCE_HTML: &str =
    "<html><body><h1>Down for maintenance</h1></body></html>";

/// Snapshot holding only the given seeds
pub fn snapshot_with_seeds(seeds: &[&str], fetched_at: i64) -> StockSnapshot {
    let mut snapshot = StockSnapshot::new(fetched_at);
    snapshot.categories.insert(
        Category::Seeds,
        seeds.iter().map(|s| s.to_string()).collect(),
    );
    snapshot
}

/// Probe with a fixed answer that counts its calls
#[derive(Default)]
pub struct MockProbe {
    healthy: bool,
    calls: AtomicUsize,
}

impl MockProbe {
    pub fn new(healthy: bool) -> Arc<Self> {
        Arc::new(Self {
            healthy,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PrimaryProbe for MockProbe {
    async fn probe_primary(&self, _last_seeds: Option<&[String]>) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.healthy
    }
}

/// Controller with default thresholds backed by `store`
pub fn controller(store: StateStore, probe: Arc<MockProbe>) -> FailoverController {
    FailoverController::new(store, probe, FailoverConfig::default())
}

/// Controller seeded with `state`
pub fn controller_with_state(
    state: FailoverState,
    store: StateStore,
    probe: Arc<MockProbe>,
) -> FailoverController {
    FailoverController::with_state(state, store, probe, FailoverConfig::default())
}

/// Notifier that keeps every event it receives
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<StockEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<StockEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events().iter().map(StockEvent::kind).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn notify(&self, event: &StockEvent) -> Result<(), NotifyError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Source returning a fixed stock and counting fetches
pub struct StaticSource {
    kind: SourceKind,
    stock: RawStock,
    fetches: AtomicUsize,
}

impl StaticSource {
    pub fn new(kind: SourceKind, stock: RawStock) -> Arc<Self> {
        Arc::new(Self {
            kind,
            stock,
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StockSource for StaticSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self) -> RawStock {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.stock.clone()
    }
}
