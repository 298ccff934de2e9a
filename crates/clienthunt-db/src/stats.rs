//! Aggregate statistics over stored businesses and sessions.

use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::DbError;

/// Every stored row is real upstream data; there is nothing else to count.
pub const SCRAPER_TYPE: &str = "REAL_BUSINESS_DATA_ONLY";
const TOP_LOCATIONS: i64 = 10;
const RECENT_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct DailyCount {
    /// `YYYY-MM-DD` (UTC).
    pub day: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScrapingStatistics {
    pub total_records: i64,
    /// Always 0. Kept so reports can show the figure explicitly.
    pub demo_data_count: i64,
    pub scraper_type: &'static str,
    /// Top locations by record count, descending.
    pub by_location: Vec<LabelCount>,
    pub by_source: Vec<LabelCount>,
    /// Records per day over the last seven days, oldest first.
    pub recent_activity: Vec<DailyCount>,
    pub total_sessions: i64,
}

/// Gather the summary shown by `clienthunt stats`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn get_scraping_statistics(pool: &SqlitePool) -> Result<ScrapingStatistics, DbError> {
    let total_records = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM businesses")
        .fetch_one(pool)
        .await?;

    let by_location = sqlx::query_as::<_, LabelCount>(
        "SELECT location AS label, COUNT(*) AS count FROM businesses \
         GROUP BY location \
         ORDER BY count DESC, label ASC \
         LIMIT ?1",
    )
    .bind(TOP_LOCATIONS)
    .fetch_all(pool)
    .await?;

    let by_source = sqlx::query_as::<_, LabelCount>(
        "SELECT source AS label, COUNT(*) AS count FROM businesses \
         GROUP BY source \
         ORDER BY count DESC, label ASC",
    )
    .fetch_all(pool)
    .await?;

    let since = Utc::now() - Duration::days(RECENT_DAYS);
    let recent_activity = sqlx::query_as::<_, DailyCount>(
        "SELECT date(scraped_at) AS day, COUNT(*) AS count FROM businesses \
         WHERE scraped_at >= ?1 \
         GROUP BY day \
         ORDER BY day ASC",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    let total_sessions = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM scraping_sessions")
        .fetch_one(pool)
        .await?;

    Ok(ScrapingStatistics {
        total_records,
        demo_data_count: 0,
        scraper_type: SCRAPER_TYPE,
        by_location,
        by_source,
        recent_activity,
        total_sessions,
    })
}
