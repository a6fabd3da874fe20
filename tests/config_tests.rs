use nimbus::config;
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

// Env vars are process-global; serialize the tests that touch them.
static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

#[test]
fn test_sanitize_base_url_removes_trailing_slash() {
    assert_eq!(
        config::sanitize_base_url("https://nimbus.example/"),
        "https://nimbus.example"
    );
}

#[test]
fn test_sanitize_base_url_multiple_trailing_slashes() {
    assert_eq!(
        config::sanitize_base_url("https://nimbus.example///"),
        "https://nimbus.example"
    );
}

#[test]
fn test_sanitize_base_url_with_whitespace() {
    assert_eq!(
        config::sanitize_base_url("  https://nimbus.example/  "),
        "https://nimbus.example"
    );
}

#[test]
fn test_sanitize_base_url_empty_string() {
    assert_eq!(config::sanitize_base_url(""), "http://localhost:5000");
}

#[test]
fn test_get_store_base_url_strips_trailing_slash() {
    let _guard = ENV_LOCK.lock().unwrap();
    env::set_var("STORE_BASE_URL", "https://store.nimbus.example/v0/");
    assert_eq!(config::get_store_base_url(), "https://store.nimbus.example/v0");
    env::remove_var("STORE_BASE_URL");
}

#[test]
fn test_get_store_base_url_defaults_to_empty() {
    let _guard = ENV_LOCK.lock().unwrap();
    env::remove_var("STORE_BASE_URL");
    assert_eq!(config::get_store_base_url(), "");
}

#[test]
fn test_get_store_collection_default_and_trim() {
    let _guard = ENV_LOCK.lock().unwrap();
    env::remove_var("STORE_COLLECTION");
    assert_eq!(config::get_store_collection(), "catalogue");
    env::set_var("STORE_COLLECTION", "  staging-catalogue  ");
    assert_eq!(config::get_store_collection(), "staging-catalogue");
    env::remove_var("STORE_COLLECTION");
}

#[test]
fn test_get_admin_username_lowercases() {
    let _guard = ENV_LOCK.lock().unwrap();
    env::set_var("ADMIN_USERNAME", "Catalogue-Admin");
    assert_eq!(config::get_admin_username(), "catalogue-admin");
    env::remove_var("ADMIN_USERNAME");
    assert_eq!(config::get_admin_username(), "admin");
}

#[test]
fn test_optional_keys_filter_blank_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    env::set_var("NOTIFY_WEBHOOK_URL", "   ");
    assert_eq!(config::get_notify_webhook_url(), None);
    env::set_var("NOTIFY_WEBHOOK_URL", "https://hooks.example/T123");
    assert_eq!(
        config::get_notify_webhook_url(),
        Some("https://hooks.example/T123".to_string())
    );
    env::remove_var("NOTIFY_WEBHOOK_URL");

    env::remove_var("FIXTURES_DIR");
    assert_eq!(config::get_fixtures_dir(), None);
    env::remove_var("CACHE_FILE");
    assert_eq!(config::get_cache_file(), None);
}
