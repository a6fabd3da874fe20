use std::env;
use std::path::Path;

// Default configuration constants
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_STORE_BASE_URL: &str = "";
pub const DEFAULT_STORE_TOKEN: &str = "";
pub const DEFAULT_STORE_COLLECTION: &str = "catalogue";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "";
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

pub fn load_env_file(env_file: Option<&str>) {
    if let Some(path) = env_file {
        dotenvy::from_path(Path::new(path)).ok();
    } else {
        dotenvy::dotenv().ok();
    }
}

pub fn get_store_base_url() -> String {
    env::var("STORE_BASE_URL")
        .unwrap_or_else(|_| DEFAULT_STORE_BASE_URL.to_string())
        .trim()
        .trim_end_matches('/')
        .to_string()
}

pub fn get_store_token() -> String {
    env::var("STORE_TOKEN").unwrap_or_else(|_| DEFAULT_STORE_TOKEN.to_string())
}

pub fn get_store_collection() -> String {
    let raw = env::var("STORE_COLLECTION").unwrap_or_default();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DEFAULT_STORE_COLLECTION.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn get_public_base_url() -> String {
    sanitize_base_url(&env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| DEFAULT_PUBLIC_BASE_URL.to_string()))
}

pub fn get_admin_username() -> String {
    let raw = env::var("ADMIN_USERNAME").unwrap_or_default();
    let trimmed = raw.trim().to_lowercase();
    if trimmed.is_empty() {
        DEFAULT_ADMIN_USERNAME.to_string()
    } else {
        trimmed
    }
}

pub fn get_admin_password() -> String {
    let raw = env::var("ADMIN_PASSWORD").unwrap_or_default();
    if raw.is_empty() {
        DEFAULT_ADMIN_PASSWORD.to_string()
    } else {
        raw
    }
}

pub fn get_notify_webhook_url() -> Option<String> {
    env::var("NOTIFY_WEBHOOK_URL")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn get_fixtures_dir() -> Option<String> {
    env::var("FIXTURES_DIR")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn get_cache_file() -> Option<String> {
    env::var("CACHE_FILE")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn sanitize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "http://localhost:5000".to_string()
    } else {
        trimmed.to_string()
    }
}
