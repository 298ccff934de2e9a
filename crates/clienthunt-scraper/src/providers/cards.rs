//! CSS-selector extraction of business "cards" from directory listing pages.

use clienthunt_core::SourceKey;
use scraper::{ElementRef, Html, Selector};

use crate::types::{collapse_whitespace, RawBusiness};

/// Selector lists for one directory layout. Each list is tried in order and
/// the first non-empty match wins.
pub(crate) struct CardLayout {
    pub card: &'static [&'static str],
    pub name: &'static [&'static str],
    pub phone: &'static [&'static str],
    pub address: &'static [&'static str],
    pub website: &'static [&'static str],
}

/// Parse `html` and return one [`RawBusiness`] per card that has a name.
///
/// Synchronous on purpose: `scraper::Html` is not `Send`, so it must never be
/// held across an await point.
pub(crate) fn extract_cards(html: &str, layout: &CardLayout, source: SourceKey) -> Vec<RawBusiness> {
    let document = Html::parse_document(html);
    let card_selectors = compile(layout.card);
    let name_selectors = compile(layout.name);
    let phone_selectors = compile(layout.phone);
    let address_selectors = compile(layout.address);
    let website_selectors = compile(layout.website);

    let Some(cards) = card_selectors.iter().find_map(|sel| {
        let found: Vec<ElementRef<'_>> = document.select(sel).collect();
        (!found.is_empty()).then_some(found)
    }) else {
        return Vec::new();
    };

    let mut results = Vec::new();
    for card in cards {
        let Some(name) = first_text(card, &name_selectors) else {
            continue;
        };
        let mut record = RawBusiness::named(name, source);
        record.contact = first_phone(card, &phone_selectors);
        record.address = first_text(card, &address_selectors);
        record.website = first_link(card, &website_selectors);
        record.raw_data = serde_json::Value::String(collapse_whitespace(
            &card.text().collect::<Vec<_>>().join(" "),
        ));
        results.push(record);
    }
    results
}

fn compile(selectors: &[&str]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
}

fn first_text(card: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        card.select(sel).find_map(|el| {
            let text = collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "));
            (!text.is_empty()).then_some(text)
        })
    })
}

/// Prefer a `tel:` href over visible text; directories often obfuscate the
/// displayed digits but keep the dial link intact.
fn first_phone(card: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        card.select(sel).find_map(|el| {
            if let Some(href) = el.value().attr("href") {
                if let Some(number) = href.strip_prefix("tel:") {
                    let number = number.trim();
                    if !number.is_empty() {
                        return Some(number.to_string());
                    }
                }
            }
            let text = collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "));
            (!text.is_empty()).then_some(text)
        })
    })
}

fn first_link(card: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        card.select(sel).find_map(|el| {
            el.value()
                .attr("href")
                .map(str::trim)
                .filter(|href| href.starts_with("http://") || href.starts_with("https://"))
                .map(str::to_string)
        })
    })
}
