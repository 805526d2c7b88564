//! Stock page parser
//!
//! Turns the primary stock page into [`RawStock`]. Sections whose id is not
//! one of the five known categories (cosmetics, for instance) are ignored.
//! Items without a name are skipped; malformed quantities become 0.

use scraper::{ElementRef, Html};

use crate::models::{Category, ItemEntry, RawStock};
use crate::parser::selectors::{StockSelectors, STOCK_SECTION_MARKER};
use crate::utils::error::ParseError;
use crate::utils::normalize_whitespace;

/// Parser for the primary stock page
pub struct StockPageParser {
    selectors: StockSelectors,
}

impl StockPageParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            selectors: StockSelectors::new(),
        }
    }

    /// Cheap structural check on the raw document text
    pub fn has_stock_markup(html: &str) -> bool {
        html.contains(STOCK_SECTION_MARKER)
    }

    /// Parse every known stock section
    ///
    /// # Errors
    /// Returns `ParseError::NoStockSections` when the document has no
    /// `section.stock-section` element at all.
    pub fn parse(&self, html: &str) -> Result<RawStock, ParseError> {
        let document = Html::parse_document(html);
        let mut stock = RawStock::empty();

        let sections: Vec<ElementRef<'_>> = document.select(&self.selectors.section).collect();
        if sections.is_empty() {
            return Err(ParseError::NoStockSections);
        }

        let known: Vec<(Category, ElementRef<'_>)> = sections
            .into_iter()
            .filter_map(|section| {
                let id = section.value().id()?;
                Category::from_section_id(id).map(|category| (category, section))
            })
            .collect();

        tracing::info!(sections = known.len(), "Found stock sections");

        for (category, section) in known {
            for element in section.select(&self.selectors.item) {
                match self.parse_item(element, category) {
                    Ok(entry) => stock.push(category, entry),
                    Err(e) => {
                        tracing::debug!(category = %category, error = %e, "Skipping stock item");
                    }
                }
            }
        }

        for (category, items) in stock.iter() {
            if !items.is_empty() {
                tracing::info!(category = %category, count = items.len(), "Parsed stock items");
            }
        }

        Ok(stock)
    }

    /// Extract one item entry
    fn parse_item(&self, element: ElementRef<'_>, category: Category) -> Result<ItemEntry, ParseError> {
        let name = element
            .select(&self.selectors.name)
            .next()
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .filter(|name| !name.is_empty())
            .ok_or(ParseError::MissingItemName)?;

        let quantity_text = element
            .select(&self.selectors.quantity)
            .next()
            .map(|el| normalize_whitespace(&el.text().collect::<String>()));

        let quantity = quantity_text.as_deref().map(parse_quantity).unwrap_or(0);

        let image_url = element
            .select(&self.selectors.image)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(str::to_string);

        let mut entry = ItemEntry {
            name: format!("{name} (x{quantity})"),
            quantity: Some(quantity),
            original_name: Some(name.clone()),
            image_url,
            ..Default::default()
        };

        // Weather carries timing text where other items carry a count
        if category == Category::Weather {
            entry.emoji = element
                .select(&self.selectors.weather_emoji)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|emoji| !emoji.is_empty());

            match quantity_text.filter(|text| !text.is_empty()) {
                Some(time_info) => {
                    entry.name = format!("{name} - {time_info}");
                    entry.time_info = Some(time_info);
                }
                None => entry.name = name,
            }
        }

        Ok(entry)
    }
}

impl Default for StockPageParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a quantity like `x12`; anything else is 0
pub fn parse_quantity(text: &str) -> u32 {
    text.trim()
        .strip_prefix('x')
        .and_then(|digits| digits.trim().parse::<u32>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawItem;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><body>
  <section class="stock-section" id="seeds-section">
    <div class="stock-item">
      <img src="https://cdn.example/carrot.png">
      <div class="item-name">Carrot</div>
      <div class="item-quantity">x14</div>
    </div>
    <div class="stock-item">
      <div class="item-name">  Blueberry  </div>
      <div class="item-quantity">lots</div>
    </div>
    <div class="stock-item">
      <div class="item-quantity">x3</div>
    </div>
  </section>
  <section class="stock-section" id="weather-section">
    <div class="stock-item">
      <span style="font-size: 2em;">⛈️</span>
      <div class="item-name">Thunderstorm</div>
      <div class="item-quantity">Most Recent</div>
    </div>
  </section>
  <section class="stock-section" id="cosmetics-section">
    <div class="stock-item"><div class="item-name">Statue</div></div>
  </section>
</body></html>"#;

    fn entry(item: &RawItem) -> &ItemEntry {
        match item {
            RawItem::Entry(entry) => entry,
            other => panic!("expected entry, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("x14"), 14);
        assert_eq!(parse_quantity(" x3 "), 3);
        assert_eq!(parse_quantity("x"), 0);
        assert_eq!(parse_quantity("xabc"), 0);
        assert_eq!(parse_quantity("14"), 0);
        assert_eq!(parse_quantity(""), 0);
    }

    #[test]
    fn test_has_stock_markup() {
        assert!(StockPageParser::has_stock_markup(PAGE));
        assert!(!StockPageParser::has_stock_markup("<html><body>Maintenance</body></html>"));
    }

    #[test]
    fn test_parse_seeds_section() {
        let stock = StockPageParser::new().parse(PAGE).unwrap();
        let seeds = stock.get(Category::Seeds);

        // Nameless item is skipped
        assert_eq!(seeds.len(), 2);

        let carrot = entry(&seeds[0]);
        assert_eq!(carrot.name, "Carrot (x14)");
        assert_eq!(carrot.quantity, Some(14));
        assert_eq!(carrot.original_name.as_deref(), Some("Carrot"));
        assert_eq!(carrot.image_url.as_deref(), Some("https://cdn.example/carrot.png"));

        let blueberry = entry(&seeds[1]);
        assert_eq!(blueberry.name, "Blueberry (x0)");
        assert_eq!(blueberry.quantity, Some(0));
    }

    #[test]
    fn test_parse_weather_uses_timing_text() {
        let stock = StockPageParser::new().parse(PAGE).unwrap();
        let weather = stock.get(Category::Weather);

        assert_eq!(weather.len(), 1);
        let storm = entry(&weather[0]);
        assert_eq!(storm.name, "Thunderstorm - Most Recent");
        assert_eq!(storm.time_info.as_deref(), Some("Most Recent"));
        assert_eq!(storm.emoji.as_deref(), Some("⛈️"));
    }

    #[test]
    fn test_unknown_sections_ignored() {
        let stock = StockPageParser::new().parse(PAGE).unwrap();
        assert_eq!(stock.total_items(), 3);
        assert!(stock.get(Category::Gears).is_empty());
        assert!(stock.get(Category::EventShop).is_empty());
    }

    #[test]
    fn test_parse_without_sections_fails() {
        let result = StockPageParser::new().parse("<html><body><p>Down</p></body></html>");
        assert_eq!(result.unwrap_err(), ParseError::NoStockSections);
    }

    #[test]
    fn test_parse_only_unknown_sections_is_empty_stock() {
        let html = r#"<section class="stock-section" id="cosmetics-section">
            <div class="stock-item"><div class="item-name">Statue</div></div></section>"#;
        let stock = StockPageParser::new().parse(html).unwrap();
        assert!(stock.is_empty());
    }
}
