use super::*;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["clienthunt", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["clienthunt", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn db_clear_defaults_to_unconfirmed() {
    let cli = Cli::try_parse_from(["clienthunt", "db", "clear"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Clear { yes: false }
        })
    ));

    let cli = Cli::try_parse_from(["clienthunt", "db", "clear", "--yes"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Clear { yes: true }
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["clienthunt"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn scrape_defaults() {
    let cli = Cli::try_parse_from(["clienthunt", "scrape", "Agra"]).unwrap();
    let Some(Commands::Scrape {
        location,
        category,
        sources,
        mode,
        max_results,
        no_store,
        export,
    }) = cli.command
    else {
        panic!("expected scrape command");
    };
    assert_eq!(location, "Agra");
    assert!(category.is_empty());
    assert!(sources.is_empty());
    assert!(mode.is_none());
    assert!(max_results.is_none());
    assert!(!no_store);
    assert!(export.is_none());
}

#[test]
fn scrape_sources_accept_repeats_and_commas() {
    let cli = Cli::try_parse_from([
        "clienthunt",
        "scrape",
        "Agra",
        "--category",
        "restaurants",
        "--source",
        "justdial,google",
        "--source",
        "yellowpages",
        "--mode",
        "comprehensive",
        "--max-results",
        "5",
        "--no-store",
        "--export",
        "out.csv",
    ])
    .unwrap();
    let Some(Commands::Scrape {
        category,
        sources,
        mode,
        max_results,
        no_store,
        export,
        ..
    }) = cli.command
    else {
        panic!("expected scrape command");
    };
    assert_eq!(category, "restaurants");
    assert_eq!(sources, vec!["justdial", "google", "yellowpages"]);
    assert_eq!(mode, Some(ModeArg::Comprehensive));
    assert_eq!(ScrapeMode::from(ModeArg::Comprehensive), ScrapeMode::Comprehensive);
    assert_eq!(max_results, Some(5));
    assert!(no_store);
    assert_eq!(export, Some(PathBuf::from("out.csv")));
}

#[test]
fn scrape_requires_location() {
    assert!(Cli::try_parse_from(["clienthunt", "scrape"]).is_err());
}

#[test]
fn scrape_rejects_unknown_mode() {
    assert!(Cli::try_parse_from(["clienthunt", "scrape", "Agra", "--mode", "deep"]).is_err());
}

#[test]
fn list_parses_source_and_dates() {
    let cli = Cli::try_parse_from([
        "clienthunt",
        "list",
        "--location",
        "Agra",
        "--source",
        "google_maps_api",
        "--since",
        "2026-10-01",
        "--until",
        "2026-10-19",
    ])
    .unwrap();
    let Some(Commands::List {
        location,
        source,
        since,
        until,
        limit,
        ..
    }) = cli.command
    else {
        panic!("expected list command");
    };
    assert_eq!(location.as_deref(), Some("Agra"));
    assert_eq!(source, Some(SourceKey::GoogleMapsApi));
    assert_eq!(since, chrono::NaiveDate::from_ymd_opt(2026, 10, 1));
    assert_eq!(until, chrono::NaiveDate::from_ymd_opt(2026, 10, 19));
    assert_eq!(limit, 50);
}

#[test]
fn list_rejects_unknown_source_key() {
    assert!(Cli::try_parse_from(["clienthunt", "list", "--source", "justdial"]).is_err());
}

#[test]
fn parses_search_stats_sources_and_export() {
    let cli = Cli::try_parse_from(["clienthunt", "search", "sweets", "--limit", "5"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Search { ref term, limit: 5 }) if term == "sweets"
    ));

    let cli = Cli::try_parse_from(["clienthunt", "stats"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Stats)));

    let cli = Cli::try_parse_from(["clienthunt", "sources"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Sources)));

    let cli =
        Cli::try_parse_from(["clienthunt", "export", "agra.csv", "--location", "Agra"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Export { ref file, location: Some(ref loc), category: None })
            if file == &PathBuf::from("agra.csv") && loc == "Agra"
    ));
}

#[test]
fn parses_sessions_listing_and_single_id() {
    let cli = Cli::try_parse_from(["clienthunt", "sessions"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Sessions { id: None, limit: 20 })
    ));

    let cli = Cli::try_parse_from(["clienthunt", "sessions", "--id", "7"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Sessions { id: Some(7), .. })
    ));
}

#[test]
fn sqlite_file_path_handles_url_forms() {
    assert_eq!(
        sqlite_file_path("sqlite://data/clienthunt.db"),
        Some(Path::new("data/clienthunt.db"))
    );
    assert_eq!(
        sqlite_file_path("sqlite:data/clienthunt.db?mode=rwc"),
        Some(Path::new("data/clienthunt.db"))
    );
    assert_eq!(sqlite_file_path("sqlite::memory:"), None);
    assert_eq!(sqlite_file_path("postgres://localhost/db"), None);
}
