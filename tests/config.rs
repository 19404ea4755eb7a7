use gtasks_sync::config::Config;
use gtasks_sync::constants::GOOGLE_TASKS_API;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert!(config.sync.concurrent_fetch);
    assert_eq!(config.graph.date_format, "yyyy-MM-dd");
    assert_eq!(config.graph.todo_marker, "TODO");
    assert!(config.graph.database_path.ends_with("gtasks-sync/graph.db"));
    assert_eq!(config.google.api_base, GOOGLE_TASKS_API);
    assert!(config.logging.enabled);
    assert_eq!(config.logging.level, "info");
    assert!(config.logging.file.is_none());
}

#[test]
fn test_config_validation() {
    let mut config = Config::default();

    // Valid config should pass
    assert!(config.validate().is_ok());

    config.graph.todo_marker = "LATER".to_string();
    assert!(config.validate().is_ok());

    // DONE is reserved for completed tasks
    config.graph.todo_marker = "DONE".to_string();
    assert!(config.validate().is_err());

    config.graph.todo_marker = "TODO".to_string();
    config.graph.date_format = "MMM do, yyyy".to_string();
    assert!(config.validate().is_ok());

    // A title without the year cannot be mapped back to a date
    config.graph.date_format = "MMM do".to_string();
    assert!(config.validate().is_err());

    config.graph.date_format = "yyyy-QQ-dd".to_string();
    assert!(config.validate().is_err());

    config.graph.date_format = "yyyy-MM-dd".to_string();
    config.logging.level = "verbose".to_string();
    assert!(config.validate().is_err());

    config.logging.level = "debug".to_string();
    config.google.api_base = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string_pretty(&config).unwrap();
    assert!(toml_str.contains("concurrent_fetch = true"));
    assert!(toml_str.contains("date_format = \"yyyy-MM-dd\""));
    assert!(toml_str.contains("todo_marker = \"TODO\""));
}

#[test]
fn test_partial_config_deserialization() {
    // Test that partial TOML configs merge with defaults
    let partial_toml = r#"
[graph]
date_format = "MMM do, yyyy"

[logging]
level = "debug"
"#;

    let config: Config = toml::from_str(partial_toml).unwrap();

    // Check that specified values are used
    assert_eq!(config.graph.date_format, "MMM do, yyyy");
    assert_eq!(config.logging.level, "debug");

    // Check that unspecified values use defaults
    assert_eq!(config.graph.todo_marker, "TODO");
    assert!(config.sync.concurrent_fetch);
    assert!(config.logging.enabled);
    assert_eq!(config.google.api_base, GOOGLE_TASKS_API);
}

#[test]
fn test_preferences_from_graph_config() {
    let mut config = Config::default();
    config.graph.date_format = "MMM do, yyyy".to_string();
    config.graph.todo_marker = "LATER".to_string();

    let prefs = config.graph.preferences().unwrap();
    assert_eq!(prefs.todo_marker, "LATER");
    assert_eq!(prefs.date_format.pattern(), "MMM do, yyyy");
}

#[test]
fn test_load_from_file_rejects_invalid_values() {
    let path = std::env::temp_dir().join(format!("gtasks-sync-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(&path, "[graph]\ntodo_marker = \"NOW\"\n").unwrap();

    let result = Config::load_from_file(&path);
    std::fs::remove_file(&path).unwrap();

    assert!(result.is_err());
}

#[test]
fn test_generate_default_config_round_trips() {
    let dir = std::env::temp_dir().join(format!("gtasks-sync-{}", uuid::Uuid::new_v4()));
    let path = dir.join("config.toml");

    Config::generate_default_config(&path).unwrap();
    let loaded = Config::load_from_file(&path).unwrap();
    std::fs::remove_dir_all(&dir).unwrap();

    assert_eq!(loaded.graph.date_format, "yyyy-MM-dd");
    assert!(loaded.sync.concurrent_fetch);
}
