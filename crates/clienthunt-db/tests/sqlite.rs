//! Persistence tests against an in-memory SQLite database with the real
//! migrations applied. Each test gets its own single-connection pool so
//! the in-memory database lives exactly as long as the test.

use chrono::{Duration, Utc};
use clienthunt_core::{BusinessRecord, DataType, SourceKey};
use clienthunt_db::{
    clear_businesses, complete_scraping_session, connect_pool, count_businesses,
    create_scraping_session, fail_scraping_session, get_scraping_session,
    get_scraping_statistics, insert_businesses, list_businesses, list_scraping_sessions, ping,
    run_migrations, search_businesses, BusinessFilter, DbError, PoolConfig, SessionStatus,
};
use sqlx::SqlitePool;

async fn test_pool() -> SqlitePool {
    let config = PoolConfig {
        max_connections: 1,
        min_connections: 1,
        acquire_timeout_secs: 5,
    };
    let pool = connect_pool("sqlite::memory:", config)
        .await
        .expect("failed to open in-memory sqlite");
    run_migrations(&pool).await.expect("migrations failed");
    pool
}

fn record(name: &str, location: &str, source: SourceKey) -> BusinessRecord {
    BusinessRecord {
        name: name.to_string(),
        contact: Some("9876543210".to_string()),
        address: Some(format!("Main Road, {location}")),
        website: None,
        category: "restaurants".to_string(),
        location: location.to_string(),
        latitude: None,
        longitude: None,
        source,
        scraped_at: Utc::now(),
        data_type: DataType::RealData,
    }
}

// ---------------------------------------------------------------------------
// Pool and migrations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn migrations_apply_once() {
    let config = PoolConfig {
        max_connections: 1,
        min_connections: 1,
        acquire_timeout_secs: 5,
    };
    let pool = connect_pool("sqlite::memory:", config).await.unwrap();

    let first = run_migrations(&pool).await.unwrap();
    let second = run_migrations(&pool).await.unwrap();
    assert_eq!(first, 2);
    assert_eq!(second, 0);
    ping(&pool).await.unwrap();
}

// ---------------------------------------------------------------------------
// businesses
// ---------------------------------------------------------------------------

#[tokio::test]
async fn insert_skips_existing_business_keys() {
    let pool = test_pool().await;
    let batch = vec![
        record("Agra Sweets", "Agra", SourceKey::JustdialReal),
        record("Pinch of Spice", "Agra", SourceKey::GoogleMapsApi),
    ];

    assert_eq!(insert_businesses(&pool, None, &batch).await.unwrap(), 2);

    // Same business re-scraped with different spacing and case.
    let again = vec![
        record("agra  sweets", "AGRA", SourceKey::YellowpagesReal),
        record("Dasaprakash", "Agra", SourceKey::YellowpagesReal),
    ];
    assert_eq!(insert_businesses(&pool, None, &again).await.unwrap(), 1);
    assert_eq!(count_businesses(&pool).await.unwrap(), 3);
}

#[tokio::test]
async fn rows_round_trip_into_records() {
    let pool = test_pool().await;
    let mut original = record("Peshawri", "Agra", SourceKey::Playwright);
    original.website = Some("https://peshawri.example.in".to_string());
    original.latitude = Some(27.1605);
    original.longitude = Some(78.0421);
    insert_businesses(&pool, None, std::slice::from_ref(&original))
        .await
        .unwrap();

    let rows = list_businesses(&pool, &BusinessFilter::default()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].data_type, "REAL_DATA");
    assert_eq!(rows[0].business_key, original.business_key());

    let restored = rows.into_iter().next().unwrap().into_record().unwrap();
    assert_eq!(restored.name, original.name);
    assert_eq!(restored.source, SourceKey::Playwright);
    assert_eq!(restored.website, original.website);
    assert_eq!(restored.latitude, Some(27.1605));
    assert_eq!(restored.data_type, DataType::RealData);
}

#[tokio::test]
async fn list_filters_by_location_category_source_and_date() {
    let pool = test_pool().await;
    let mut old = record("Old Agra Dhaba", "Agra", SourceKey::JustdialReal);
    old.scraped_at = Utc::now() - Duration::days(30);
    let mut delhi = record("Karim's", "Delhi", SourceKey::GoogleMapsApi);
    delhi.category = "hotels".to_string();
    let batch = vec![
        old,
        record("Agra Sweets", "Agra", SourceKey::JustdialReal),
        record("Dasaprakash", "Agra", SourceKey::YellowpagesReal),
        delhi,
    ];
    insert_businesses(&pool, None, &batch).await.unwrap();

    let agra = list_businesses(
        &pool,
        &BusinessFilter {
            location: Some("agra".to_string()),
            ..BusinessFilter::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(agra.len(), 3);

    let hotels = list_businesses(
        &pool,
        &BusinessFilter {
            category: Some("HOTEL".to_string()),
            ..BusinessFilter::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(hotels.len(), 1);
    assert_eq!(hotels[0].name, "Karim's");

    let justdial_recent = list_businesses(
        &pool,
        &BusinessFilter {
            source: Some(SourceKey::JustdialReal),
            scraped_since: Some(Utc::now() - Duration::days(7)),
            ..BusinessFilter::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(justdial_recent.len(), 1);
    assert_eq!(justdial_recent[0].name, "Agra Sweets");

    let limited = list_businesses(
        &pool,
        &BusinessFilter {
            limit: Some(2),
            ..BusinessFilter::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(limited.len(), 2);
}

#[tokio::test]
async fn search_matches_name_address_and_category() {
    let pool = test_pool().await;
    let mut tech = record("Taj Infotech", "Agra", SourceKey::JustdialReal);
    tech.category = "it companies".to_string();
    tech.address = Some("Sanjay Place, Agra".to_string());
    let batch = vec![tech, record("Agra Sweets", "Agra", SourceKey::JustdialReal)];
    insert_businesses(&pool, None, &batch).await.unwrap();

    assert_eq!(search_businesses(&pool, "infotech", 50).await.unwrap().len(), 1);
    assert_eq!(search_businesses(&pool, "sanjay", 50).await.unwrap().len(), 1);
    assert_eq!(search_businesses(&pool, "it comp", 50).await.unwrap().len(), 1);
    assert_eq!(search_businesses(&pool, "agra", 50).await.unwrap().len(), 2);
    assert!(search_businesses(&pool, "100%", 50).await.unwrap().is_empty());
}

#[tokio::test]
async fn clear_removes_businesses_but_keeps_sessions() {
    let pool = test_pool().await;
    let session = create_scraping_session(&pool, "Agra", "", &["justdial_real"])
        .await
        .unwrap();
    let batch = vec![record("Agra Sweets", "Agra", SourceKey::JustdialReal)];
    insert_businesses(&pool, Some(session.id), &batch).await.unwrap();

    assert_eq!(clear_businesses(&pool).await.unwrap(), 1);
    assert_eq!(count_businesses(&pool).await.unwrap(), 0);
    assert!(get_scraping_session(&pool, session.id).await.is_ok());
}

// ---------------------------------------------------------------------------
// scraping_sessions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn session_lifecycle_completed_and_with_errors() {
    let pool = test_pool().await;

    let clean = create_scraping_session(&pool, "Agra", "restaurants", &["justdial_real"])
        .await
        .unwrap();
    assert_eq!(clean.status, "running");
    assert_eq!(clean.sources, "justdial_real");
    assert!(clean.completed_at.is_none());

    let status = complete_scraping_session(&pool, clean.id, 12, 0).await.unwrap();
    assert_eq!(status, SessionStatus::Completed);
    let row = get_scraping_session(&pool, clean.id).await.unwrap();
    assert_eq!(row.status, "completed");
    assert_eq!(row.total_scraped, 12);
    assert!(row.completed_at.is_some());

    let partial = create_scraping_session(
        &pool,
        "Agra",
        "",
        &["justdial_real", "google_maps_api"],
    )
    .await
    .unwrap();
    let status = complete_scraping_session(&pool, partial.id, 5, 1).await.unwrap();
    assert_eq!(status, SessionStatus::CompletedWithErrors);
    assert_eq!(
        get_scraping_session(&pool, partial.id).await.unwrap().status,
        "completed_with_errors"
    );
}

#[tokio::test]
async fn failed_session_cannot_be_completed() {
    let pool = test_pool().await;
    let session = create_scraping_session(&pool, "Agra", "", &["google_maps_api"])
        .await
        .unwrap();

    fail_scraping_session(&pool, session.id, 1, "google_maps_api: missing key")
        .await
        .unwrap();
    let row = get_scraping_session(&pool, session.id).await.unwrap();
    assert_eq!(row.status, "failed");
    assert_eq!(row.error_message.as_deref(), Some("google_maps_api: missing key"));

    let err = complete_scraping_session(&pool, session.id, 0, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidSessionTransition { .. }));
}

#[tokio::test]
async fn missing_session_is_not_found() {
    let pool = test_pool().await;
    let err = get_scraping_session(&pool, 999).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound));
}

#[tokio::test]
async fn sessions_list_newest_first() {
    let pool = test_pool().await;
    let first = create_scraping_session(&pool, "Agra", "", &[]).await.unwrap();
    let second = create_scraping_session(&pool, "Delhi", "", &[]).await.unwrap();

    let sessions = list_scraping_sessions(&pool, 10).await.unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].id, second.id);
    assert_eq!(sessions[1].id, first.id);
    assert_ne!(first.public_id, second.public_id);
}

// ---------------------------------------------------------------------------
// statistics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn statistics_report_real_data_only() {
    let pool = test_pool().await;
    create_scraping_session(&pool, "Agra", "", &["justdial_real"])
        .await
        .unwrap();
    let batch = vec![
        record("Agra Sweets", "Agra", SourceKey::JustdialReal),
        record("Dasaprakash", "Agra", SourceKey::YellowpagesReal),
        record("Karim's", "Delhi", SourceKey::JustdialReal),
    ];
    insert_businesses(&pool, None, &batch).await.unwrap();

    let stats = get_scraping_statistics(&pool).await.unwrap();
    assert_eq!(stats.total_records, 3);
    assert_eq!(stats.demo_data_count, 0);
    assert_eq!(stats.scraper_type, "REAL_BUSINESS_DATA_ONLY");
    assert_eq!(stats.total_sessions, 1);

    assert_eq!(stats.by_location[0].label, "Agra");
    assert_eq!(stats.by_location[0].count, 2);
    assert_eq!(stats.by_source[0].label, "justdial_real");
    assert_eq!(stats.by_source[0].count, 2);

    assert_eq!(stats.recent_activity.len(), 1);
    assert_eq!(stats.recent_activity[0].count, 3);
}

#[tokio::test]
async fn statistics_on_empty_database() {
    let pool = test_pool().await;
    let stats = get_scraping_statistics(&pool).await.unwrap();
    assert_eq!(stats.total_records, 0);
    assert!(stats.by_location.is_empty());
    assert!(stats.recent_activity.is_empty());
}
