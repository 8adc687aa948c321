use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_match_documented_values() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.to_string(), "127.0.0.1:3000");
    assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(30));
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert!(settings.database.url.is_none());
    assert_eq!(settings.database.max_connections.get(), 8);
    assert!(settings.database.run_migrations);
    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.backend, CacheBackendKind::Redis);
    assert_eq!(settings.cache.default_ttl_seconds.get(), 600);
    assert!(settings.cache.key_prefix.is_empty());
    assert_eq!(settings.catalog.search_limit_default.get(), 20);
    assert_eq!(settings.catalog.search_limit_max.get(), 100);
    assert_eq!(settings.catalog.sku_max_attempts.get(), 5);
}

#[test]
fn default_settings_agree_with_service_defaults() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(
        crate::application::catalog::CatalogPolicy::from(&settings.catalog),
        crate::application::catalog::CatalogPolicy::default()
    );
    assert_eq!(
        crate::cache::CacheConfig::from(&settings.cache).default_ttl,
        crate::cache::CacheConfig::default().default_ttl
    );
}

#[test]
fn zero_cache_ttl_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.default_ttl_seconds = Some(0);

    match Settings::from_raw(raw) {
        Err(LoadError::Invalid { key, .. }) => assert_eq!(key, "cache.default_ttl_seconds"),
        other => panic!("expected invalid ttl, got {other:?}"),
    }
}

#[test]
fn search_limit_max_must_cover_default() {
    let mut raw = RawSettings::default();
    raw.catalog.search_limit_default = Some(50);
    raw.catalog.search_limit_max = Some(10);

    match Settings::from_raw(raw) {
        Err(LoadError::Invalid { key, .. }) => assert_eq!(key, "catalog.search_limit_max"),
        other => panic!("expected invalid search limit, got {other:?}"),
    }
}

#[test]
fn blank_database_url_is_treated_as_missing() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn cli_cache_overrides_apply() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        cache_backend: Some(CacheBackendKind::Memory),
        cache_default_ttl_seconds: Some(30),
        cache_key_prefix: Some("staging:".to_string()),
        cache_enabled: Some(false),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.cache.backend, CacheBackendKind::Memory);
    assert_eq!(settings.cache.default_ttl_seconds.get(), 30);
    assert_eq!(settings.cache.key_prefix, "staging:");
    assert!(!settings.cache.enabled);
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["catalog"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_arguments() {
    let args = CliArgs::parse_from([
        "catalog",
        "serve",
        "--server-port",
        "8080",
        "--cache-backend",
        "memory",
        "--cache-enabled",
        "false",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_port, Some(8080));
            assert_eq!(serve.overrides.cache_backend, Some(CacheBackendKind::Memory));
            assert_eq!(serve.overrides.cache_enabled, Some(false));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_migrate_arguments() {
    let args = CliArgs::parse_from([
        "catalog",
        "migrate",
        "--database-url",
        "postgres://example",
    ]);

    match args.command.expect("migrate command") {
        Command::Migrate(migrate) => {
            assert_eq!(
                migrate.database.database_url.as_deref(),
                Some("postgres://example")
            );
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn migrate_only_applies_database_override() {
    let mut raw = RawSettings::default();
    raw.apply_database_override(&DatabaseOverride {
        database_url: Some("postgres://migrate".to_string()),
    });

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.database.url.as_deref(), Some("postgres://migrate"));
}
