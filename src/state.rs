use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::catalogue::{CatalogueEditor, CatalogueLoader, TtlCache};
use crate::catalogue::cache::CACHE_TTL;
use crate::notify::Notifier;
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<Mutex<HashMap<String, String>>>,
    pub flash_store: Arc<Mutex<HashMap<String, Vec<String>>>>,
    pub admin_username: String,
    pub admin_password_hash: String,
    pub public_base_url: String,
    pub client: reqwest::Client,
    /// Public read path: enrichment join behind the five-minute cache.
    pub loader: Arc<CatalogueLoader>,
    /// Admin edit path. Shares the loader so a save invalidates the same
    /// cache the storefront reads from.
    pub editor: Arc<CatalogueEditor>,
    pub notifier: Notifier,
    pub custom_css: Option<String>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collection: impl Into<String>,
        cache: TtlCache,
        client: reqwest::Client,
        admin_username: String,
        admin_password_hash: String,
        public_base_url: String,
        notifier: Notifier,
    ) -> Self {
        let collection = collection.into();
        let loader = Arc::new(CatalogueLoader::with_cache(store.clone(), collection.clone(), cache));
        let editor = Arc::new(CatalogueEditor::with_loader(store, collection, loader.clone()));
        AppState {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            flash_store: Arc::new(Mutex::new(HashMap::new())),
            admin_username,
            admin_password_hash,
            public_base_url,
            client,
            loader,
            editor,
            notifier,
            custom_css: None,
        }
    }

    /// Minimal state over an arbitrary store, used by tests.
    pub fn for_store(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        let client = reqwest::Client::new();
        AppState::new(
            store,
            collection,
            TtlCache::new(CACHE_TTL),
            client.clone(),
            "admin".into(),
            crate::auth::generate_password_hash("admin123"),
            "http://localhost:8080".into(),
            Notifier::new(client, None),
        )
    }
}
