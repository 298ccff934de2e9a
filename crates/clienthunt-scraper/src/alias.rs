//! User-facing source aliases and their canonical registry keys.

/// Alias → canonical key. Canonical keys also map to themselves so callers
/// can pass either spelling.
const ALIASES: &[(&str, &str)] = &[
    ("justdial", "justdial_real"),
    ("justdial_real", "justdial_real"),
    ("googlemaps", "google_maps_api"),
    ("google_maps", "google_maps_api"),
    ("google", "google_maps_api"),
    ("google_maps_api", "google_maps_api"),
    ("yellowpages", "yellowpages_real"),
    ("yellow_pages", "yellowpages_real"),
    ("yellowpages_real", "yellowpages_real"),
    ("maps", "playwright"),
    ("browser", "playwright"),
    ("playwright", "playwright"),
];

/// Resolve a source alias to its canonical registry key.
///
/// Matching ignores case and surrounding whitespace. Unknown aliases are
/// returned unchanged so the orchestrator can report them by the name the
/// caller used.
#[must_use]
pub fn resolve(alias: &str) -> String {
    let needle = alias.trim().to_ascii_lowercase();
    ALIASES
        .iter()
        .find(|(name, _)| *name == needle)
        .map_or_else(|| alias.to_string(), |(_, key)| (*key).to_string())
}

/// Every `(alias, canonical)` pair, for help output.
#[must_use]
pub fn known_aliases() -> &'static [(&'static str, &'static str)] {
    ALIASES
}
