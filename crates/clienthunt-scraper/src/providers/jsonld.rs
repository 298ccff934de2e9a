//! schema.org JSON-LD extraction.

use std::sync::LazyLock;

use clienthunt_core::SourceKey;
use regex::Regex;

use crate::types::{non_blank, RawBusiness};

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

const ACCEPTED_TYPES: [&str; 11] = [
    "LocalBusiness",
    "Store",
    "ProfessionalService",
    "FoodEstablishment",
    "Restaurant",
    "LodgingBusiness",
    "Hotel",
    "MedicalBusiness",
    "AutomotiveBusiness",
    "HomeAndConstructionBusiness",
    "EducationalOrganization",
];

/// Extract businesses from `<script type="application/ld+json">` blocks.
pub(crate) fn extract_jsonld_businesses(html: &str, source: SourceKey) -> Vec<RawBusiness> {
    let mut results = Vec::new();

    for cap in SCRIPT_RE.captures_iter(html) {
        let Some(json_text) = cap.get(1).map(|m| m.as_str()) else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(json_text) else {
            continue;
        };

        let mut candidates: Vec<serde_json::Value> = match value {
            serde_json::Value::Array(items) => items,
            other => vec![other],
        };

        // {"@graph": [...]} and ItemList wrappers both hide the entries one
        // level down; an ItemList may itself sit inside the graph.
        let graph: Vec<serde_json::Value> = candidates
            .iter()
            .filter_map(|item| item.get("@graph").and_then(serde_json::Value::as_array))
            .flatten()
            .cloned()
            .collect();
        candidates.extend(graph);

        let listed: Vec<serde_json::Value> = candidates
            .iter()
            .filter_map(|item| {
                item.get("itemListElement")
                    .and_then(serde_json::Value::as_array)
            })
            .flatten()
            .map(|entry| entry.get("item").cloned().unwrap_or_else(|| entry.clone()))
            .collect();
        candidates.extend(listed);

        results.extend(
            candidates
                .iter()
                .filter_map(|item| jsonld_item_to_business(item, source)),
        );
    }

    results
}

fn jsonld_item_to_business(item: &serde_json::Value, source: SourceKey) -> Option<RawBusiness> {
    let type_node = item.get("@type")?;

    // `@type` may be a plain string or an array of strings.
    let type_matches = if let Some(s) = type_node.as_str() {
        ACCEPTED_TYPES.iter().any(|t| s.eq_ignore_ascii_case(t))
    } else if let Some(arr) = type_node.as_array() {
        arr.iter()
            .filter_map(|v| v.as_str())
            .any(|s| ACCEPTED_TYPES.iter().any(|t| s.eq_ignore_ascii_case(t)))
    } else {
        false
    };
    if !type_matches {
        return None;
    }

    let name = non_blank(item.get("name").and_then(|v| v.as_str()))?;
    let address = item.get("address");
    let geo = item.get("geo");

    let address_text = match address {
        Some(serde_json::Value::String(s)) => non_blank(Some(s)),
        Some(obj) => {
            let parts: Vec<&str> = ["streetAddress", "addressLocality", "addressRegion", "postalCode"]
                .iter()
                .filter_map(|field| obj.get(field).and_then(|v| v.as_str()))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        None => None,
    };
    let locality = non_blank(
        address
            .and_then(|a| a.get("addressLocality"))
            .and_then(|v| v.as_str()),
    );

    // geo.latitude / geo.longitude may be strings or numbers in the wild.
    let coordinate = |field: &str| {
        geo.and_then(|g| g.get(field)).and_then(|v| {
            v.as_f64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        })
    };

    let mut record = RawBusiness::named(name, source);
    record.contact = non_blank(item.get("telephone").and_then(|v| v.as_str()));
    record.address = address_text;
    record.website = non_blank(item.get("url").and_then(|v| v.as_str()));
    record.location = locality;
    record.latitude = coordinate("latitude");
    record.longitude = coordinate("longitude");
    record.raw_data = item.clone();
    Some(record)
}
