mod export;
mod query;
mod scrape;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use clienthunt_core::{ScrapeMode, SourceKey};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "clienthunt")]
#[command(about = "Collect real business listings from Indian business directories")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape businesses for a location and store them
    Scrape {
        /// City or locality, e.g. "Agra"
        location: String,
        /// Business category, e.g. "restaurants"
        #[arg(long, default_value = "")]
        category: String,
        /// Source to query; repeat or comma-separate. Aliases such as
        /// "justdial" or "google" are accepted
        #[arg(long = "source", value_delimiter = ',')]
        sources: Vec<String>,
        /// Scrape preset; defaults to CLIENTHUNT_SCRAPE_MODE
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        /// Per-source cap; overrides the preset's cap
        #[arg(long)]
        max_results: Option<usize>,
        /// Print results without writing to the database
        #[arg(long)]
        no_store: bool,
        /// Also write accepted records to this CSV file
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// List stored businesses
    List {
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Canonical source key, e.g. justdial_real
        #[arg(long)]
        source: Option<SourceKey>,
        /// Only records scraped on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<chrono::NaiveDate>,
        /// Only records scraped on or before this date (YYYY-MM-DD)
        #[arg(long)]
        until: Option<chrono::NaiveDate>,
        #[arg(long, default_value = "50")]
        limit: i64,
    },
    /// Search stored businesses by name, address or category
    Search {
        term: String,
        #[arg(long, default_value = "50")]
        limit: i64,
    },
    /// Show scraping statistics
    Stats,
    /// Show recent scraping sessions, or one session by id
    Sessions {
        /// Session id as printed in the listing
        #[arg(long)]
        id: Option<i64>,
        #[arg(long, default_value = "20")]
        limit: i64,
    },
    /// Export stored businesses to CSV
    Export {
        file: PathBuf,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// List registered sources and accepted aliases
    Sources,
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check database connectivity
    Ping,
    /// Delete every stored business (sessions are kept)
    Clear {
        /// Required to confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Quick,
    Comprehensive,
}

impl From<ModeArg> for ScrapeMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Quick => ScrapeMode::Quick,
            ModeArg::Comprehensive => ScrapeMode::Comprehensive,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = clienthunt_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(env = %config.env, scrape_mode = %config.scrape_mode, "loaded configuration");

    let Some(command) = cli.command else {
        println!("clienthunt: run with --help to see available commands");
        return Ok(());
    };

    if matches!(command, Commands::Sources) {
        query::print_sources();
        return Ok(());
    }

    let pool = connect(&config).await?;
    run_command(&pool, &config, command).await
}

async fn run_command(
    pool: &sqlx::SqlitePool,
    config: &clienthunt_core::AppConfig,
    command: Commands,
) -> anyhow::Result<()> {
    match command {
        Commands::Scrape {
            location,
            category,
            sources,
            mode,
            max_results,
            no_store,
            export,
        } => {
            let options = scrape::ScrapeOptions {
                location,
                category,
                sources,
                mode: mode.map_or(config.scrape_mode, ScrapeMode::from),
                max_results,
                store: !no_store,
                export,
            };
            scrape::run_scrape(pool, config, &options).await?;
        }
        Commands::List {
            location,
            category,
            source,
            since,
            until,
            limit,
        } => {
            let filter = query::build_filter(location, category, source, since, until, limit);
            query::run_list(pool, &filter).await?;
        }
        Commands::Search { term, limit } => query::run_search(pool, &term, limit).await?,
        Commands::Stats => query::run_stats(pool).await?,
        Commands::Sessions { id, limit } => query::run_sessions(pool, id, limit).await?,
        Commands::Export {
            file,
            location,
            category,
        } => export::run_export(pool, &file, location, category).await?,
        Commands::Db { command } => run_db_command(pool, command).await?,
        Commands::Sources => query::print_sources(),
    }

    Ok(())
}

async fn connect(config: &clienthunt_core::AppConfig) -> anyhow::Result<sqlx::SqlitePool> {
    ensure_sqlite_parent_dir(&config.database_url)?;
    let pool_config = clienthunt_db::PoolConfig::from_app_config(config);
    let pool = clienthunt_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = clienthunt_db::run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "applied database migrations");
    }
    Ok(pool)
}

async fn run_db_command(pool: &sqlx::SqlitePool, command: DbCommands) -> anyhow::Result<()> {
    match command {
        DbCommands::Migrate => {
            // connect() already migrated; a second run reports zero.
            let applied = clienthunt_db::run_migrations(pool).await?;
            println!("migrations up to date ({applied} newly applied)");
        }
        DbCommands::Ping => {
            clienthunt_db::health_check(pool).await?;
            println!("database ok");
        }
        DbCommands::Clear { yes } => {
            if !yes {
                anyhow::bail!("refusing to clear businesses without --yes");
            }
            let deleted = clienthunt_db::clear_businesses(pool).await?;
            println!("deleted {deleted} businesses");
        }
    }
    Ok(())
}

/// SQLite creates the database file but not its directory.
fn ensure_sqlite_parent_dir(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_file_path(database_url) else {
        return Ok(());
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn sqlite_file_path(database_url: &str) -> Option<&Path> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let rest = rest.split('?').next().unwrap_or(rest);
    if rest.is_empty() || rest.starts_with(":memory:") {
        return None;
    }
    Some(Path::new(rest))
}

/// Mark a session failed, logging rather than propagating any DB error so
/// the original failure stays the one reported.
pub(crate) async fn fail_session_best_effort(
    pool: &sqlx::SqlitePool,
    session_id: i64,
    error_count: i64,
    message: &str,
) {
    if let Err(e) =
        clienthunt_db::fail_scraping_session(pool, session_id, error_count, message).await
    {
        tracing::error!(session_id, error = %e, "failed to mark scraping session as failed");
    }
}

#[cfg(test)]
mod tests;
