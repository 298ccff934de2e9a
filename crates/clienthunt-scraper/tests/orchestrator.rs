//! End-to-end orchestrator tests against `wiremock` stand-ins for every
//! upstream directory. Each provider gets its own path prefix on one mock
//! server so requests can be told apart.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clienthunt_core::{DataType, SourceEndpoints, SourceKey};
use clienthunt_scraper::{
    Orchestrator, ScrapeResult, ScraperSettings, SourceErrorKind, SourceRegistry,
    COMPREHENSIVE_MAX_RESULTS, QUICK_MAX_RESULTS,
};

/// Settings pointing every provider at `server`: no retries, no pacing.
fn test_settings(server: &MockServer, api_key: Option<&str>) -> ScraperSettings {
    let uri = server.uri();
    ScraperSettings {
        request_timeout_secs: 5,
        user_agent: "clienthunt-test/0.1".to_string(),
        max_retries: 0,
        backoff_base_secs: 0,
        inter_request_delay_ms: 0,
        max_concurrent_sources: 3,
        deadline: Duration::from_secs(30),
        google_maps_api_key: api_key.map(str::to_string),
        geocoding_enabled: false,
        endpoints: SourceEndpoints {
            justdial_base_url: format!("{uri}/jd"),
            yellowpages_base_url: format!("{uri}/yp"),
            google_places_base_url: format!("{uri}/places"),
            directory_base_url: format!("{uri}/dir"),
            nominatim_base_url: format!("{uri}/geo"),
        },
    }
}

fn orchestrator(settings: ScraperSettings) -> Orchestrator {
    let registry =
        Arc::new(SourceRegistry::from_settings(&settings).expect("failed to build registry"));
    Orchestrator::new(registry, settings).expect("failed to build orchestrator")
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn attempted(result: &ScrapeResult) -> BTreeSet<SourceKey> {
    result.sources_attempted.iter().copied().collect()
}

const JUSTDIAL_PAGE: &str = r#"<html><head>
<script id="__NEXT_DATA__" type="application/json">
{"props":{"pageProps":{"results":[
  {"compname":"Agra Software Hub","mobile":"9876543210","address":"Sikandra, Agra"},
  {"compname":"Taj Infotech","phone":"+91-9123456789","locality":"Kamla Nagar"},
  {"compname":"Bad Phone Traders","mobile":"12345","address":"Belanganj"},
  {"docid":"no-name"}
]}}}
</script></head><body></body></html>"#;

const YELLOWPAGES_PAGE: &str = r#"<html><body>
<div class="listing">
  <h3 class="business-name">Agra  Software Hub</h3>
  <a href="tel:9876543210">Call</a>
  <p class="address">Sikandra, Agra</p>
</div>
<div class="listing">
  <h3 class="business-name">Dasaprakash</h3>
  <span class="phone">0562-2363368</span>
  <p class="address">Gwalior Road, Agra</p>
</div>
</body></html>"#;

const DIRECTORY_PAGE: &str = r#"<html><head>
<script type="application/ld+json">
{"@context":"https://schema.org","@type":"Restaurant","name":"Peshawri",
 "telephone":"+91 562 402 8000",
 "address":{"@type":"PostalAddress","streetAddress":"Fatehabad Road","addressLocality":"Agra"},
 "url":"https://peshawri.example.in"}
</script></head><body></body></html>"#;

async fn mount_justdial(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/jd/Agra/Restaurants"))
        .respond_with(ResponseTemplate::new(200).set_body_string(JUSTDIAL_PAGE))
        .mount(server)
        .await;
}

async fn mount_yellowpages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/yp/search"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/yp/search"))
        .and(query_param("what", "restaurants"))
        .and(query_param("where", "Agra"))
        .respond_with(ResponseTemplate::new(200).set_body_string(YELLOWPAGES_PAGE))
        .mount(server)
        .await;
}

async fn mount_google(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/places/textsearch/json"))
        .and(query_param("key", "test-key"))
        .and(query_param("query", "restaurants in Agra"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [{ "place_id": "p1", "name": "Pinch of Spice" }]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/places/details/json"))
        .and(query_param("place_id", "p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "result": {
                "name": "Pinch of Spice",
                "formatted_address": "Fatehabad Road, Agra",
                "formatted_phone_number": "0562 400 1234",
                "website": "https://pinchofspice.example.in",
                "geometry": { "location": { "lat": 27.1605, "lng": 78.0421 } }
            }
        })))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// End-to-end: mixed known and unknown aliases
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mixed_aliases_merge_real_records_and_report_unknown_sources() {
    let server = MockServer::start().await;
    mount_justdial(&server).await;
    mount_yellowpages(&server).await;
    mount_google(&server).await;

    let sources = strings(&["justdial", "google", "yellowpages", "indiamart", "it_clients"]);
    let result = orchestrator(test_settings(&server, Some("test-key")))
        .scrape_location("Agra", "restaurants", &sources, 50)
        .await
        .expect("scrape should not fail as a whole");

    let unknown: Vec<&str> = result
        .errors
        .iter()
        .filter(|e| e.kind == SourceErrorKind::UnknownSource)
        .map(|e| e.source.as_str())
        .collect();
    assert_eq!(unknown, vec!["indiamart", "it_clients"]);
    assert_eq!(result.errors.len(), 2, "unexpected errors: {:?}", result.errors);

    assert_eq!(
        attempted(&result),
        BTreeSet::from([
            SourceKey::JustdialReal,
            SourceKey::GoogleMapsApi,
            SourceKey::YellowpagesReal
        ])
    );

    // Agra Software Hub appears on two sources and is kept once.
    assert_eq!(result.total_results, 4);
    assert_eq!(result.records.len(), 4);
    assert_eq!(result.rejected_duplicate, 1);
    assert_eq!(result.rejected_invalid, 1);
    assert_eq!(
        result
            .records
            .iter()
            .filter(|r| r.name == "Agra Software Hub")
            .count(),
        1
    );
    assert_eq!(result.per_source.get(&SourceKey::GoogleMapsApi), Some(&1));
    assert_eq!(result.per_source.values().sum::<usize>(), 4);

    assert!(result.records.iter().all(|r| r.data_type == DataType::RealData));
    assert!(result
        .records
        .iter()
        .all(|r| result.sources_attempted.contains(&r.source)));
    assert_eq!(result.data_type, DataType::RealData);

    let google = result
        .records
        .iter()
        .find(|r| r.source == SourceKey::GoogleMapsApi)
        .expect("google record present");
    assert_eq!(google.contact.as_deref(), Some("05624001234"));
    assert_eq!(google.latitude, Some(27.1605));
    assert_eq!(google.category, "restaurants");
    assert_eq!(google.location, "Agra");
}

#[tokio::test]
async fn identical_requests_yield_identical_counts() {
    let server = MockServer::start().await;
    mount_justdial(&server).await;
    mount_yellowpages(&server).await;
    mount_google(&server).await;

    let orch = orchestrator(test_settings(&server, Some("test-key")));
    let sources = strings(&["justdial_real", "google_maps_api", "yellowpages_real"]);
    let first = orch
        .scrape_location("Agra", "restaurants", &sources, 50)
        .await
        .unwrap();
    let second = orch
        .scrape_location("Agra", "restaurants", &sources, 50)
        .await
        .unwrap();

    assert_eq!(first.total_results, second.total_results);
    assert_eq!(first.rejected_invalid, second.rejected_invalid);
    assert_eq!(first.rejected_duplicate, second.rejected_duplicate);
}

// ---------------------------------------------------------------------------
// Quick / comprehensive presets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn quick_scrape_uses_justdial_and_google_with_cap_20() {
    let server = MockServer::start().await;
    mount_justdial(&server).await;
    mount_google(&server).await;
    Mock::given(method("GET"))
        .and(path("/yp/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(YELLOWPAGES_PAGE))
        .expect(0)
        .mount(&server)
        .await;

    let result = orchestrator(test_settings(&server, Some("test-key")))
        .quick_scrape("Agra", "restaurants", &[])
        .await
        .unwrap();

    assert_eq!(result.max_results_per_source, QUICK_MAX_RESULTS);
    assert_eq!(result.max_results_per_source, 20);
    assert_eq!(
        attempted(&result),
        BTreeSet::from([SourceKey::JustdialReal, SourceKey::GoogleMapsApi])
    );
    assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
    assert_eq!(result.total_results, 3);
}

#[tokio::test]
async fn comprehensive_scrape_adds_yellowpages_with_cap_50() {
    let server = MockServer::start().await;
    mount_justdial(&server).await;
    mount_yellowpages(&server).await;
    mount_google(&server).await;

    let result = orchestrator(test_settings(&server, Some("test-key")))
        .comprehensive_scrape("Agra", "restaurants", &[])
        .await
        .unwrap();

    assert_eq!(result.max_results_per_source, COMPREHENSIVE_MAX_RESULTS);
    assert_eq!(result.max_results_per_source, 50);
    assert_eq!(
        attempted(&result),
        BTreeSet::from([
            SourceKey::JustdialReal,
            SourceKey::GoogleMapsApi,
            SourceKey::YellowpagesReal
        ])
    );
}

#[tokio::test]
async fn selected_sources_override_preset_defaults() {
    let server = MockServer::start().await;
    mount_yellowpages(&server).await;

    let result = orchestrator(test_settings(&server, None))
        .quick_scrape("Agra", "restaurants", &strings(&["yellow_pages"]))
        .await
        .unwrap();

    assert_eq!(result.sources_attempted, vec![SourceKey::YellowpagesReal]);
    assert_eq!(result.per_source.get(&SourceKey::YellowpagesReal), Some(&2));
}

// ---------------------------------------------------------------------------
// Caps, duplicates in the request, and failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn per_source_cap_truncates_before_validation() {
    let server = MockServer::start().await;
    mount_justdial(&server).await;

    let result = orchestrator(test_settings(&server, None))
        .scrape_location("Agra", "restaurants", &strings(&["justdial"]), 1)
        .await
        .unwrap();

    assert_eq!(result.total_results, 1);
    assert_eq!(result.records[0].name, "Agra Software Hub");
    assert_eq!(result.rejected_invalid, 0);
}

#[tokio::test]
async fn repeated_aliases_run_the_source_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jd/Agra/Restaurants"))
        .respond_with(ResponseTemplate::new(200).set_body_string(JUSTDIAL_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let result = orchestrator(test_settings(&server, None))
        .scrape_location(
            "Agra",
            "restaurants",
            &strings(&["justdial", "JustDial", "justdial_real"]),
            10,
        )
        .await
        .unwrap();

    assert_eq!(result.sources_attempted, vec![SourceKey::JustdialReal]);
    assert_eq!(result.total_results, 2);
}

#[tokio::test]
async fn missing_google_key_is_an_adapter_failure() {
    let server = MockServer::start().await;
    mount_justdial(&server).await;

    let result = orchestrator(test_settings(&server, None))
        .scrape_location("Agra", "restaurants", &strings(&["justdial", "google"]), 10)
        .await
        .unwrap();

    assert_eq!(result.errors.len(), 1);
    let err = &result.errors[0];
    assert_eq!(err.source, "google_maps_api");
    assert_eq!(err.kind, SourceErrorKind::AdapterFailure);
    assert!(err.message.contains("GOOGLE_MAPS_API_KEY"), "message: {}", err.message);
    assert_eq!(result.total_results, 2);
    assert!(!result.all_sources_failed());
}

#[tokio::test]
async fn google_api_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/places/textsearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid.",
            "results": []
        })))
        .mount(&server)
        .await;

    let result = orchestrator(test_settings(&server, Some("bad-key")))
        .scrape_location("Agra", "", &strings(&["google"]), 10)
        .await
        .unwrap();

    assert_eq!(result.total_results, 0);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, SourceErrorKind::AdapterFailure);
    assert!(result.errors[0].message.contains("REQUEST_DENIED"));
    assert!(result.all_sources_failed());
}

#[tokio::test]
async fn empty_upstream_is_zero_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/yp/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>No results</body></html>"))
        .mount(&server)
        .await;

    let result = orchestrator(test_settings(&server, None))
        .scrape_location("Agra", "restaurants", &strings(&["yellowpages"]), 10)
        .await
        .unwrap();

    assert!(result.errors.is_empty());
    assert_eq!(result.total_results, 0);
    assert_eq!(result.per_source.get(&SourceKey::YellowpagesReal), Some(&0));
}

#[tokio::test]
async fn slow_source_times_out_without_blocking_others() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jd/Agra/Restaurants"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(JUSTDIAL_PAGE)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    mount_yellowpages(&server).await;

    let mut settings = test_settings(&server, None);
    settings.deadline = Duration::from_millis(500);

    let result = orchestrator(settings)
        .scrape_location("Agra", "restaurants", &strings(&["justdial", "yellowpages"]), 10)
        .await
        .unwrap();

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].source, "justdial_real");
    assert_eq!(result.errors[0].kind, SourceErrorKind::TimedOut);
    assert_eq!(result.per_source.get(&SourceKey::YellowpagesReal), Some(&2));
}

#[tokio::test]
async fn browser_directory_extracts_structured_listings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dir/restaurants/agra"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DIRECTORY_PAGE))
        .mount(&server)
        .await;

    let result = orchestrator(test_settings(&server, None))
        .scrape_location("Agra", "Restaurants", &strings(&["browser"]), 10)
        .await
        .unwrap();

    assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
    assert_eq!(result.total_results, 1);
    let record = &result.records[0];
    assert_eq!(record.name, "Peshawri");
    assert_eq!(record.source, SourceKey::Playwright);
    assert_eq!(record.website.as_deref(), Some("https://peshawri.example.in"));
    assert_eq!(record.contact.as_deref(), Some("+915624028000"));
}

// ---------------------------------------------------------------------------
// Cross-source dedup keys off the query location
// ---------------------------------------------------------------------------

#[tokio::test]
async fn provider_city_does_not_split_cross_source_duplicates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jd/Agra/Restaurants"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><script id="__NEXT_DATA__" type="application/json">
{"props":{"pageProps":{"results":[
  {"compname":"Pinch of Spice","mobile":"9876543210","city":"Agra Cantt"}
]}}}
</script></head><body></body></html>"#,
        ))
        .mount(&server)
        .await;
    mount_google(&server).await;

    let result = orchestrator(test_settings(&server, Some("test-key")))
        .scrape_location("Agra", "restaurants", &strings(&["justdial", "google"]), 10)
        .await
        .unwrap();

    assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
    assert_eq!(result.total_results, 1);
    assert_eq!(result.rejected_duplicate, 1);
    assert_eq!(result.records[0].location, "Agra");
}

// ---------------------------------------------------------------------------
// Google details at the comprehensive cap fit inside the deadline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn google_details_at_comprehensive_cap_are_not_paced_one_by_one() {
    let server = MockServer::start().await;
    let place = |i: usize| json!({ "place_id": format!("p{i}"), "name": format!("Agra Place {i}") });

    Mock::given(method("GET"))
        .and(path("/places/textsearch/json"))
        .and(query_param("query", "restaurants in Agra"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": (0..20).map(place).collect::<Vec<_>>(),
            "next_page_token": "t2"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/places/textsearch/json"))
        .and(query_param("pagetoken", "t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": (20..40).map(place).collect::<Vec<_>>(),
            "next_page_token": "t3"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/places/textsearch/json"))
        .and(query_param("pagetoken", "t3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": (40..60).map(place).collect::<Vec<_>>()
        })))
        .mount(&server)
        .await;
    for i in 0..60 {
        Mock::given(method("GET"))
            .and(path("/places/details/json"))
            .and(query_param("place_id", format!("p{i}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "result": {
                    "name": format!("Agra Place {i}"),
                    "formatted_address": format!("{i} MG Road, Agra"),
                    "formatted_phone_number": format!("0562 400 {:04}", 1000 + i)
                }
            })))
            .mount(&server)
            .await;
    }

    // Realistic 2 s spacing; one detail call per spacing would need ~100 s.
    let mut settings = test_settings(&server, Some("test-key"));
    settings.inter_request_delay_ms = 2_000;
    settings.deadline = Duration::from_secs(20);

    let result = orchestrator(settings)
        .comprehensive_scrape("Agra", "restaurants", &strings(&["google"]))
        .await
        .unwrap();

    assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
    assert_eq!(result.total_results, COMPREHENSIVE_MAX_RESULTS);
    assert_eq!(result.per_source[&SourceKey::GoogleMapsApi], COMPREHENSIVE_MAX_RESULTS);
    // Details come back in text-search order.
    assert_eq!(result.records[0].name, "Agra Place 0");
    assert_eq!(result.records[49].name, "Agra Place 49");
}
