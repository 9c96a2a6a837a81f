use super::{normalize_database_url, prepare_database_url, resolve_settings, Settings};

use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_apply_without_file_or_env() {
    assert_eq!(resolve_settings(None, env_from(&[])), Settings::default());
}

#[test]
fn file_values_are_overridden_by_env() {
    let file = r#"
bind_addr = "0.0.0.0:9000"
database_url = "sqlite://./file.db"
seed_demo_data = true
max_body_bytes = 1024
"#;
    let settings = resolve_settings(
        Some(file),
        env_from(&[
            ("DATABASE_URL", "sqlite://./plain.db"),
            ("APP__DATABASE_URL", "sqlite://./app.db"),
        ]),
    );
    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(settings.database_url, "sqlite://./app.db");
    assert!(settings.seed_demo_data);
    assert_eq!(settings.max_body_bytes, 1024);
}

#[test]
fn invalid_env_values_keep_previous_setting() {
    let settings = resolve_settings(
        Some("this is = not toml ["),
        env_from(&[("APP__MAX_BODY_BYTES", "lots"), ("APP__SEED_DEMO_DATA", "no")]),
    );
    assert_eq!(settings.max_body_bytes, Settings::default().max_body_bytes);
    assert!(!settings.seed_demo_data);
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(
        normalize_database_url("sqlite::memory:"),
        "sqlite::memory:"
    );
    assert_eq!(normalize_database_url("  "), Settings::default().database_url);
}

#[tokio::test]
async fn prepared_database_url_creates_openable_sqlite_file() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("catalog.db");

    let prepared = prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare");
    assert!(temp_root.path().join("nested").exists());

    let storage = storage::Storage::new(&prepared).await.expect("open sqlite");
    drop(storage);
    assert!(
        db_path.exists(),
        "database file should be created: {}",
        db_path.display()
    );
}
