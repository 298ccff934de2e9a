//! Read-only commands: `list`, `search`, `stats`, `sessions` and `sources`.

use std::fmt::Write as _;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use clienthunt_core::SourceKey;
use clienthunt_db::{BusinessFilter, BusinessRow, ScrapingSessionRow};
use clienthunt_scraper::alias;

pub(crate) fn build_filter(
    location: Option<String>,
    category: Option<String>,
    source: Option<SourceKey>,
    since: Option<NaiveDate>,
    until: Option<NaiveDate>,
    limit: i64,
) -> BusinessFilter {
    BusinessFilter {
        location,
        category,
        source,
        scraped_since: since.map(start_of_day),
        scraped_until: until.map(end_of_day),
        limit: Some(limit),
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::microseconds(1)
}

/// # Errors
///
/// Returns an error if the query fails.
pub(crate) async fn run_list(pool: &sqlx::SqlitePool, filter: &BusinessFilter) -> anyhow::Result<()> {
    let rows = clienthunt_db::list_businesses(pool, filter).await?;
    print_rows(&rows);
    Ok(())
}

/// # Errors
///
/// Returns an error if the query fails.
pub(crate) async fn run_search(pool: &sqlx::SqlitePool, term: &str, limit: i64) -> anyhow::Result<()> {
    if term.trim().is_empty() {
        anyhow::bail!("search term must not be empty");
    }
    let rows = clienthunt_db::search_businesses(pool, term, limit).await?;
    print_rows(&rows);
    Ok(())
}

/// # Errors
///
/// Returns an error if any statistics query fails.
pub(crate) async fn run_stats(pool: &sqlx::SqlitePool) -> anyhow::Result<()> {
    let stats = clienthunt_db::get_scraping_statistics(pool).await?;

    println!("Total records:   {}", stats.total_records);
    println!("Demo records:    {}", stats.demo_data_count);
    println!("Scraper type:    {}", stats.scraper_type);
    println!("Sessions:        {}", stats.total_sessions);

    println!("\nTop locations:");
    for row in &stats.by_location {
        println!("  {:<30} {:>6}", row.label, row.count);
    }
    println!("\nBy source:");
    for row in &stats.by_source {
        println!("  {:<30} {:>6}", row.label, row.count);
    }
    println!("\nLast 7 days:");
    if stats.recent_activity.is_empty() {
        println!("  no records");
    }
    for day in &stats.recent_activity {
        println!("  {:<30} {:>6}", day.day, day.count);
    }
    Ok(())
}

/// Print one session in full when `id` is given, otherwise the latest
/// `limit` sessions.
///
/// # Errors
///
/// Returns an error if the query fails or no session has the given id.
pub(crate) async fn run_sessions(
    pool: &sqlx::SqlitePool,
    id: Option<i64>,
    limit: i64,
) -> anyhow::Result<()> {
    if let Some(id) = id {
        let session = clienthunt_db::get_scraping_session(pool, id)
            .await
            .map_err(|e| anyhow::anyhow!("session {id}: {e}"))?;
        print!("{}", session_detail(&session));
        return Ok(());
    }

    let sessions = clienthunt_db::list_scraping_sessions(pool, limit).await?;
    if sessions.is_empty() {
        println!("no scraping sessions");
        return Ok(());
    }
    for session in &sessions {
        println!("{}", session_line(session));
    }
    Ok(())
}

fn session_line(session: &ScrapingSessionRow) -> String {
    format!(
        "{:>5}  {}  {:<22} {:<20} {:>5} records {:>3} errors",
        session.id,
        session.started_at.format("%Y-%m-%d %H:%M"),
        session.status,
        session.location,
        session.total_scraped,
        session.error_count,
    )
}

fn session_detail(session: &ScrapingSessionRow) -> String {
    let category = if session.category.is_empty() {
        "any"
    } else {
        session.category.as_str()
    };
    let completed = session
        .completed_at
        .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
    let mut out = format!(
        "Session {} ({})\n  location:  {}\n  category:  {category}\n  sources:   {}\n  status:    {}\n  started:   {}\n  completed: {completed}\n  records:   {}\n  errors:    {}\n",
        session.id,
        session.public_id,
        session.location,
        session.sources,
        session.status,
        session.started_at.to_rfc3339(),
        session.total_scraped,
        session.error_count,
    );
    if let Some(message) = &session.error_message {
        let _ = writeln!(out, "  message:   {message}");
    }
    out
}

pub(crate) fn print_sources() {
    println!("Registered sources:");
    for key in SourceKey::ALL {
        let aliases: Vec<&str> = alias::known_aliases()
            .iter()
            .filter(|(alias, canonical)| *canonical == key.as_str() && *alias != key.as_str())
            .map(|(alias, _)| *alias)
            .collect();
        println!("  {:<20} aliases: {}", key.as_str(), aliases.join(", "));
    }
}

fn print_rows(rows: &[BusinessRow]) {
    if rows.is_empty() {
        println!("no businesses found");
        return;
    }
    for row in rows {
        println!(
            "{:<40} {:<15} {:<16} {:<12} {}",
            row.name,
            row.contact.as_deref().unwrap_or("-"),
            row.source,
            row.scraped_at.format("%Y-%m-%d"),
            row.address.as_deref().unwrap_or("-"),
        );
    }
    println!("{} businesses", rows.len());
}
