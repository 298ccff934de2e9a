//! `clienthunt scrape`: run the orchestrator, render the result, persist
//! accepted records and track the run as a scraping session.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use clienthunt_core::{AppConfig, ScrapeMode};
use clienthunt_scraper::{
    alias, Orchestrator, ScrapeResult, ScraperSettings, SourceErrorKind, SourceRegistry,
    COMPREHENSIVE_SOURCES, QUICK_SOURCES,
};

use crate::fail_session_best_effort;

#[derive(Debug, Clone)]
pub(crate) struct ScrapeOptions {
    pub location: String,
    pub category: String,
    pub sources: Vec<String>,
    pub mode: ScrapeMode,
    pub max_results: Option<usize>,
    pub store: bool,
    pub export: Option<PathBuf>,
}

/// # Errors
///
/// Returns an error for an invalid request (blank location, zero cap), or
/// when the session, insert or export cannot be written. Per-source failures
/// are printed as warnings and recorded on the session, not propagated.
pub(crate) async fn run_scrape(
    pool: &sqlx::SqlitePool,
    config: &AppConfig,
    options: &ScrapeOptions,
) -> anyhow::Result<()> {
    let settings = ScraperSettings::from_app_config(config);
    let registry = Arc::new(
        SourceRegistry::from_settings(&settings)
            .map_err(|e| anyhow::anyhow!("failed to build source registry: {e}"))?,
    );
    let orchestrator = Orchestrator::new(registry, settings)
        .map_err(|e| anyhow::anyhow!("failed to build scrape orchestrator: {e}"))?;

    let labels = session_source_labels(options);
    let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();
    let session = if options.store {
        Some(
            clienthunt_db::create_scraping_session(
                pool,
                options.location.trim(),
                options.category.trim(),
                &label_refs,
            )
            .await?,
        )
    } else {
        None
    };

    let outcome = match (options.max_results, options.mode) {
        (Some(cap), _) => {
            orchestrator
                .scrape_location(&options.location, &options.category, &options.sources, cap)
                .await
        }
        (None, ScrapeMode::Quick) => {
            orchestrator
                .quick_scrape(&options.location, &options.category, &options.sources)
                .await
        }
        (None, ScrapeMode::Comprehensive) => {
            orchestrator
                .comprehensive_scrape(&options.location, &options.category, &options.sources)
                .await
        }
    };

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            if let Some(session) = &session {
                fail_session_best_effort(pool, session.id, 0, &e.to_string()).await;
            }
            return Err(e.into());
        }
    };

    print!("{}", render_result(&result, options.mode));

    if let Some(session) = &session {
        println!("{}", finish_session(pool, session, &result).await?);
    }

    if let Some(path) = &options.export {
        let written = crate::export::write_records_to_path(path, &result.records)?;
        println!("exported {written} records to {}", path.display());
    }

    Ok(())
}

/// Persist accepted records and close the session.
///
/// Any storage error marks the session failed before it is returned, so no
/// session is left `running`.
async fn finish_session(
    pool: &sqlx::SqlitePool,
    session: &clienthunt_db::ScrapingSessionRow,
    result: &ScrapeResult,
) -> anyhow::Result<String> {
    let error_count = i64::try_from(result.errors.len()).unwrap_or(i64::MAX);
    if result.all_sources_failed() {
        fail_session_best_effort(pool, session.id, error_count, &error_summary(result)).await;
        return Ok(format!("session {} marked failed", session.public_id));
    }

    let stored = async {
        let inserted =
            clienthunt_db::insert_businesses(pool, Some(session.id), &result.records).await?;
        let total = i64::try_from(result.total_results).unwrap_or(i64::MAX);
        let status =
            clienthunt_db::complete_scraping_session(pool, session.id, total, error_count).await?;
        Ok::<_, clienthunt_db::DbError>((inserted, status))
    }
    .await;

    match stored {
        Ok((inserted, status)) => Ok(format!(
            "stored {inserted} new businesses ({} already known); session {} {status}",
            result
                .records
                .len()
                .saturating_sub(usize::try_from(inserted).unwrap_or(0)),
            session.public_id,
        )),
        Err(e) => {
            let message = format!("failed to store scrape results: {e}");
            fail_session_best_effort(pool, session.id, error_count, &message).await;
            Err(anyhow::anyhow!(message))
        }
    }
}

/// Canonical keys the session will try, or the caller's spelling for
/// aliases that do not resolve.
fn session_source_labels(options: &ScrapeOptions) -> Vec<String> {
    if options.sources.is_empty() {
        let defaults = match options.mode {
            ScrapeMode::Quick if options.max_results.is_none() => &QUICK_SOURCES[..],
            ScrapeMode::Quick | ScrapeMode::Comprehensive => &COMPREHENSIVE_SOURCES[..],
        };
        return defaults.iter().map(|k| k.as_str().to_string()).collect();
    }
    let mut labels: Vec<String> = Vec::new();
    for source in &options.sources {
        let resolved = alias::resolve(source);
        if !labels.contains(&resolved) {
            labels.push(resolved);
        }
    }
    labels
}

fn error_summary(result: &ScrapeResult) -> String {
    result
        .errors
        .iter()
        .map(|e| format!("{}: {}", e.source, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Human-readable report: one line per source, then the accepted records.
pub(crate) fn render_result(result: &ScrapeResult, mode: ScrapeMode) -> String {
    let mut out = String::new();
    let category = if result.category.is_empty() {
        "any"
    } else {
        result.category.as_str()
    };
    let _ = writeln!(
        out,
        "Scrape of {} (category: {category}, mode: {mode}, max {}/source)",
        result.location, result.max_results_per_source,
    );

    for (key, count) in &result.per_source {
        if let Some(err) = result.errors.iter().find(|e| e.source == key.as_str()) {
            let _ = writeln!(out, "  \u{2717} {:<20} {} ({})", key.as_str(), err.message, err.kind);
        } else {
            let _ = writeln!(out, "  \u{2713} {:<20} {count:>4} records", key.as_str());
        }
    }
    for err in result
        .errors
        .iter()
        .filter(|e| e.kind == SourceErrorKind::UnknownSource)
    {
        let _ = writeln!(out, "  ! {:<20} {}", err.source, err.message);
    }

    let _ = writeln!(
        out,
        "Accepted {} records ({} invalid, {} duplicates) in {:.1}s",
        result.total_results,
        result.rejected_invalid,
        result.rejected_duplicate,
        result.elapsed.as_secs_f64(),
    );
    if result.scrubbed_fields > 0 {
        let _ = writeln!(
            out,
            "Cleared {} placeholder contact/website values.",
            result.scrubbed_fields
        );
    }
    if result.errors.is_empty() {
        let _ = writeln!(out, "No source errors.");
    } else {
        let _ = writeln!(out, "warning: {} source(s) reported errors", result.errors.len());
    }

    for record in &result.records {
        let _ = writeln!(
            out,
            "  {:<40} {:<15} {:<16} {}",
            truncate(&record.name, 40),
            record.contact.as_deref().unwrap_or("-"),
            record.source.as_str(),
            record.address.as_deref().unwrap_or("-"),
        );
    }
    out
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('\u{2026}');
    cut
}
