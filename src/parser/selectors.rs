//! CSS selectors for the primary stock page
//!
//! The page groups items into `section.stock-section` blocks whose element id
//! names the category (see [`Category::section_id`](crate::models::Category::section_id)).

use lazy_static::lazy_static;
use scraper::Selector;

/// Raw-text marker every healthy stock page contains
pub const STOCK_SECTION_MARKER: &str = "stock-section";

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

lazy_static! {
    static ref SECTION: Selector = parse_selector!("section.stock-section");
    static ref ITEM: Selector = parse_selector!("div.stock-item");
    static ref ITEM_NAME: Selector = parse_selector!("div.item-name");
    static ref ITEM_QUANTITY: Selector = parse_selector!("div.item-quantity");
    static ref ITEM_IMAGE: Selector = parse_selector!("img[src]");
    static ref WEATHER_EMOJI: Selector = parse_selector!("span[style*='font-size: 2em']");
}

/// Selectors for one stock page layout
#[derive(Debug, Clone)]
pub struct StockSelectors {
    pub section: Selector,
    pub item: Selector,
    pub name: Selector,
    pub quantity: Selector,
    pub image: Selector,
    pub weather_emoji: Selector,
}

impl StockSelectors {
    pub fn new() -> Self {
        Self {
            section: SECTION.clone(),
            item: ITEM.clone(),
            name: ITEM_NAME.clone(),
            quantity: ITEM_QUANTITY.clone(),
            image: ITEM_IMAGE.clone(),
            weather_emoji: WEATHER_EMOJI.clone(),
        }
    }
}

impl Default for StockSelectors {
    fn default() -> Self {
        Self::new()
    }
}
