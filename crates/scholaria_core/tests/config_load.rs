use scholaria_core::{ConfigError, ScholariaConfig, SearchConfig, Store};

#[test]
fn load_or_init_writes_defaults_then_reads_them_back() {
    let dir = tempfile::tempdir().unwrap();

    let created = ScholariaConfig::load_or_init(dir.path()).unwrap();
    assert!(dir.path().join("scholaria.json").exists());
    assert_eq!(created, ScholariaConfig::default());

    let loaded = ScholariaConfig::load_or_init(dir.path()).unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn load_or_init_honours_custom_search_bounds() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("scholaria.json"),
        r#"{
            "database": { "path": "catalogue.sqlite3" },
            "search": { "default_page_size": 5, "max_page_size": 10, "default_sort": "name" }
        }"#,
    )
    .unwrap();

    let config = ScholariaConfig::load_or_init(dir.path()).unwrap();
    assert_eq!(
        config.search,
        SearchConfig {
            default_page_size: 5,
            max_page_size: 10,
            default_sort: "name".to_string(),
        }
    );
    assert_eq!(
        config.database_path(dir.path()),
        dir.path().join("catalogue.sqlite3")
    );

    let store = Store::open(&config, dir.path()).unwrap();
    assert_eq!(store.search_config().max_page_size, 10);
    store.close().unwrap();
    assert!(dir.path().join("catalogue.sqlite3").exists());
}

#[test]
fn load_or_init_rejects_invalid_bounds() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("scholaria.json"),
        r#"{
            "database": { "path": null },
            "search": { "default_page_size": 50, "max_page_size": 10, "default_sort": "name" }
        }"#,
    )
    .unwrap();

    let err = ScholariaConfig::load_or_init(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn load_or_init_reports_parse_errors_with_path() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("scholaria.json"), "{ not json").unwrap();

    let err = ScholariaConfig::load_or_init(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("scholaria.json"));
}

#[test]
fn load_or_init_fills_missing_sections_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("scholaria.json"), "{}").unwrap();

    let config = ScholariaConfig::load_or_init(dir.path()).unwrap();
    assert_eq!(config, ScholariaConfig::default());
    assert_eq!(
        config.database_path(dir.path()),
        dir.path().join("scholaria.sqlite3")
    );
}
