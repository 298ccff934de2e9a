//! Database operations for the `businesses` table.

use chrono::{DateTime, Utc};
use clienthunt_core::{BusinessRecord, DataType, SourceKey};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::DbError;

const DEFAULT_LIST_LIMIT: i64 = 500;

/// A row from the `businesses` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BusinessRow {
    pub id: i64,
    pub business_key: String,
    pub name: String,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub category: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub source: String,
    pub scraped_at: DateTime<Utc>,
    pub data_type: String,
    pub session_id: Option<i64>,
}

impl BusinessRow {
    /// Convert back into the domain type.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Decode`] if `source` or `data_type` holds a value
    /// the domain enums do not know.
    pub fn into_record(self) -> Result<BusinessRecord, DbError> {
        let source = self
            .source
            .parse::<SourceKey>()
            .map_err(|e| DbError::Decode(e.to_string()))?;
        let data_type = self
            .data_type
            .parse::<DataType>()
            .map_err(|e| DbError::Decode(e.to_string()))?;
        Ok(BusinessRecord {
            name: self.name,
            contact: self.contact,
            address: self.address,
            website: self.website,
            category: self.category,
            location: self.location,
            latitude: self.latitude,
            longitude: self.longitude,
            source,
            scraped_at: self.scraped_at,
            data_type,
        })
    }
}

/// Optional filters for [`list_businesses`]. Text filters match
/// case-insensitively anywhere in the column.
#[derive(Debug, Clone, Default)]
pub struct BusinessFilter {
    pub location: Option<String>,
    pub category: Option<String>,
    pub source: Option<SourceKey>,
    pub scraped_since: Option<DateTime<Utc>>,
    pub scraped_until: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

const BUSINESS_COLUMNS: &str = "id, business_key, name, contact, address, website, category, \
     location, latitude, longitude, source, scraped_at, data_type, session_id";

/// Insert accepted records in one transaction.
///
/// Rows whose `business_key` already exists are skipped. Returns the number
/// of rows actually inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert or the commit fails; nothing from
/// the batch is kept in that case.
pub async fn insert_businesses(
    pool: &SqlitePool,
    session_id: Option<i64>,
    records: &[BusinessRecord],
) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;
    let mut inserted: u64 = 0;

    for record in records {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO businesses \
             (business_key, name, contact, address, website, category, location, \
              latitude, longitude, source, scraped_at, data_type, session_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(record.business_key())
        .bind(&record.name)
        .bind(&record.contact)
        .bind(&record.address)
        .bind(&record.website)
        .bind(&record.category)
        .bind(&record.location)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(record.source.as_str())
        .bind(record.scraped_at)
        .bind(record.data_type.as_str())
        .bind(session_id)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// List stored businesses matching `filter`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_businesses(
    pool: &SqlitePool,
    filter: &BusinessFilter,
) -> Result<Vec<BusinessRow>, DbError> {
    let mut qb: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new(format!("SELECT {BUSINESS_COLUMNS} FROM businesses WHERE 1 = 1"));

    if let Some(location) = filter.location.as_deref().filter(|s| !s.trim().is_empty()) {
        qb.push(" AND location LIKE ")
            .push_bind(like_pattern(location))
            .push(" ESCAPE '\\'");
    }
    if let Some(category) = filter.category.as_deref().filter(|s| !s.trim().is_empty()) {
        qb.push(" AND category LIKE ")
            .push_bind(like_pattern(category))
            .push(" ESCAPE '\\'");
    }
    if let Some(source) = filter.source {
        qb.push(" AND source = ").push_bind(source.as_str());
    }
    if let Some(since) = filter.scraped_since {
        qb.push(" AND scraped_at >= ").push_bind(since);
    }
    if let Some(until) = filter.scraped_until {
        qb.push(" AND scraped_at <= ").push_bind(until);
    }
    qb.push(" ORDER BY scraped_at DESC, id DESC LIMIT ")
        .push_bind(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT).max(1));

    let rows = qb.build_query_as::<BusinessRow>().fetch_all(pool).await?;
    Ok(rows)
}

/// Case-insensitive substring search over name, address and category.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn search_businesses(
    pool: &SqlitePool,
    term: &str,
    limit: i64,
) -> Result<Vec<BusinessRow>, DbError> {
    let pattern = like_pattern(term.trim());
    let rows = sqlx::query_as::<_, BusinessRow>(&format!(
        "SELECT {BUSINESS_COLUMNS} FROM businesses \
         WHERE name LIKE ?1 ESCAPE '\\' \
            OR address LIKE ?1 ESCAPE '\\' \
            OR category LIKE ?1 ESCAPE '\\' \
         ORDER BY scraped_at DESC, id DESC \
         LIMIT ?2"
    ))
    .bind(pattern)
    .bind(limit.max(1))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_businesses(pool: &SqlitePool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM businesses")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Delete every stored business. Sessions are kept. Returns rows deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn clear_businesses(pool: &SqlitePool) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM businesses").execute(pool).await?;
    Ok(result.rows_affected())
}

/// `%term%` with LIKE wildcards in `term` escaped.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
