//! Core data structures and types
//!
//! Raw items enter the crate through [`RawItem`] and [`RawStock`], the shapes
//! both sources produce. Normalization reduces them to a [`StockSnapshot`],
//! which holds only plain display names.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Categories
// ============================================================================

/// Shop stock category
///
/// The two sources disagree on spelling (`gears` vs `gear`, `eggs` vs `egg`),
/// so both spellings are accepted when parsing or deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "seeds")]
    Seeds,
    #[serde(rename = "gears", alias = "gear")]
    Gears,
    #[serde(rename = "eggs", alias = "egg")]
    Eggs,
    #[serde(rename = "weather")]
    Weather,
    #[serde(rename = "event_shop")]
    EventShop,
}

impl Category {
    /// All categories in canonical order
    pub const ALL: [Category; 5] = [
        Category::Seeds,
        Category::Gears,
        Category::Eggs,
        Category::Weather,
        Category::EventShop,
    ];

    /// Canonical (plural) category name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seeds => "seeds",
            Self::Gears => "gears",
            Self::Eggs => "eggs",
            Self::Weather => "weather",
            Self::EventShop => "event_shop",
        }
    }

    /// Key used in the consumer-facing four-key view, if exposed there
    pub fn consumer_key(&self) -> Option<&'static str> {
        match self {
            Self::Seeds => Some("seeds"),
            Self::Gears => Some("gear"),
            Self::Eggs => Some("egg"),
            Self::Weather => Some("weather"),
            Self::EventShop => None,
        }
    }

    /// Section element id on the primary stock page
    pub fn section_id(&self) -> &'static str {
        match self {
            Self::Seeds => "seeds-section",
            Self::Gears => "gears-section",
            Self::Eggs => "eggs-section",
            Self::Weather => "weather-section",
            Self::EventShop => "event-shop-stock-section",
        }
    }

    /// Map a section element id back to its category
    pub fn from_section_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.section_id() == id)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "seeds" | "seed" => Ok(Self::Seeds),
            "gears" | "gear" => Ok(Self::Gears),
            "eggs" | "egg" => Ok(Self::Eggs),
            "weather" => Ok(Self::Weather),
            "event_shop" | "event-shop" | "honey" => Ok(Self::EventShop),
            other => Err(format!("Unknown stock category: {other}")),
        }
    }
}

// ============================================================================
// Source Kind
// ============================================================================

/// Which data source a snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Scraped HTML stock page
    Primary,
    /// JSON stock API
    Secondary,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "primary" | "main" | "website" => Ok(Self::Primary),
            "secondary" | "fallback" | "api" => Ok(Self::Secondary),
            other => Err(format!(
                "Unknown source '{other}'. Valid options: primary, fallback"
            )),
        }
    }
}

// ============================================================================
// Raw Items
// ============================================================================

/// Structured item as produced by the scraper (and by some API payloads)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemEntry {
    /// Display name (already decorated with quantity or timing text)
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,

    /// Stock quantity, 0 when unknown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,

    /// Undecorated item name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Weather icon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,

    /// Weather timing text ("Most Recent", "Ends in 3m", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_info: Option<String>,
}

/// A stock item exactly as a source delivered it
///
/// Sources hand back either bare strings or objects carrying a `name`;
/// anything else is kept verbatim so normalization can decide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawItem {
    Name(String),
    Entry(ItemEntry),
    Other(serde_json::Value),
}

impl From<&str> for RawItem {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<ItemEntry> for RawItem {
    fn from(entry: ItemEntry) -> Self {
        Self::Entry(entry)
    }
}

/// Accept strings, numbers, booleans or null where a name string is expected
///
/// Nested objects and arrays carry no usable name and become empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            String::new()
        }
    })
}

/// Un-normalized stock as returned by a source
///
/// Always carries all five categories. [`RawStock::empty`] doubles as the
/// "total failure" signal from the primary source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStock {
    categories: BTreeMap<Category, Vec<RawItem>>,
}

impl RawStock {
    /// Stock with every category present and empty
    pub fn empty() -> Self {
        Self {
            categories: Category::ALL.into_iter().map(|c| (c, Vec::new())).collect(),
        }
    }

    /// Append one item to a category
    pub fn push(&mut self, category: Category, item: impl Into<RawItem>) {
        self.categories.entry(category).or_default().push(item.into());
    }

    /// Replace the items of a category
    pub fn set(&mut self, category: Category, items: Vec<RawItem>) {
        self.categories.insert(category, items);
    }

    pub fn get(&self, category: Category) -> &[RawItem] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// True when no category holds any item
    pub fn is_empty(&self) -> bool {
        self.categories.values().all(Vec::is_empty)
    }

    pub fn total_items(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &[RawItem])> {
        self.categories.iter().map(|(c, items)| (*c, items.as_slice()))
    }
}

impl Default for RawStock {
    fn default() -> Self {
        Self::empty()
    }
}

// ============================================================================
// Stock Snapshot
// ============================================================================

/// One normalized read of current stock across all categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SnapshotRepr")]
pub struct StockSnapshot {
    /// Category to ordered, deduplicated display names
    pub categories: BTreeMap<Category, Vec<String>>,

    /// Unix timestamp of acquisition
    pub fetched_at: i64,
}

/// Current layout, plus the flat layout older state files used
/// (`{"seeds": [...], "gear": [...], "timestamp": 0}`)
#[derive(Deserialize)]
struct SnapshotRepr {
    #[serde(default)]
    categories: BTreeMap<Category, Vec<String>>,
    #[serde(default)]
    fetched_at: Option<i64>,
    #[serde(flatten)]
    legacy: BTreeMap<String, serde_json::Value>,
}

impl From<SnapshotRepr> for StockSnapshot {
    fn from(repr: SnapshotRepr) -> Self {
        let fetched_at = repr
            .fetched_at
            .or_else(|| repr.legacy.get("timestamp").and_then(serde_json::Value::as_i64))
            .unwrap_or_default();

        let mut snapshot = StockSnapshot::new(fetched_at);
        for (key, value) in repr.legacy {
            let Ok(category) = key.parse::<Category>() else {
                continue;
            };
            if let Ok(items) = serde_json::from_value::<Vec<RawItem>>(value) {
                snapshot
                    .categories
                    .insert(category, crate::pipeline::normalize_items(&items));
            }
        }
        for (category, items) in repr.categories {
            snapshot.categories.insert(category, items);
        }
        snapshot
    }
}

impl StockSnapshot {
    /// Empty snapshot with all five categories present
    pub fn new(fetched_at: i64) -> Self {
        Self {
            categories: Category::ALL.into_iter().map(|c| (c, Vec::new())).collect(),
            fetched_at,
        }
    }

    pub fn get(&self, category: Category) -> &[String] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn seeds(&self) -> &[String] {
        self.get(Category::Seeds)
    }

    /// Seeds as an order-independent set
    pub fn seed_set(&self) -> BTreeSet<&str> {
        self.seeds().iter().map(String::as_str).collect()
    }

    /// Compare `seeds` against another snapshot, ignoring order
    pub fn same_seeds(&self, other: &StockSnapshot) -> bool {
        self.seed_set() == other.seed_set()
    }

    /// True when no category holds any item
    pub fn is_empty(&self) -> bool {
        self.categories.values().all(Vec::is_empty)
    }

    pub fn total_items(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    /// Four-key mapping handed to consumers: `seeds`, `gear`, `egg`, `weather`
    pub fn consumer_view(&self) -> BTreeMap<&'static str, Vec<String>> {
        Category::ALL
            .into_iter()
            .filter_map(|c| c.consumer_key().map(|key| (key, self.get(c).to_vec())))
            .collect()
    }
}
