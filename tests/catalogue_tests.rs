use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nimbus::catalogue::{enrich_categories, CatalogueLoader, CategoryDoc, Language};
use nimbus::store::{DocumentStore, MemoryStore, StoreError};

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.seed(
        "catalogue",
        "vps",
        json!({
            "id": "vps",
            "name": "VPS",
            "products": [
                {"id": "vps1", "name": "VPS 1", "monthly": 10.0},
                {"id": "vps2", "name": "VPS 2", "monthly": 20.0},
                {"id": "legacy", "name": "Legacy box", "monthly": 5.0}
            ],
            "translations": {
                "fr": {"vps1": {"usage": "test"}},
                "en": {"vps2": {"usage": "burst compute", "description": "On-demand compute"}}
            }
        }),
    );
    store.seed(
        "catalogue",
        "_manifest",
        json!({"categories": ["vps"], "totalProducts": 3, "version": 2}),
    );
    store
}

async fn load(store: Arc<MemoryStore>, lang: Option<Language>) -> Vec<nimbus::catalogue::EnrichedCategory> {
    CatalogueLoader::new(store, "catalogue").load(lang).await
}

#[tokio::test]
async fn translated_products_appear_for_their_language() {
    let out = load(seeded_store(), Some(Language::En)).await;
    let ids: Vec<&str> = out[0].products.iter().map(|p| p.id.as_str()).collect();
    assert!(ids.contains(&"vps2"));
    let vps2 = out[0].products.iter().find(|p| p.id == "vps2").unwrap();
    assert_eq!(vps2.usage, "burst compute");
    assert_eq!(vps2.description, "On-demand compute");
}

#[tokio::test]
async fn untranslated_everywhere_falls_back_with_sentinels() {
    let out = load(seeded_store(), Some(Language::En)).await;
    let legacy = out[0]
        .products
        .iter()
        .find(|p| p.id == "legacy")
        .expect("legacy product listed despite missing translations");
    assert_eq!(legacy.usage, "N/A");
    assert_eq!(legacy.description, "N/A");
}

// The visibility rule is asymmetric on purpose: a product translated
// only in the other language is hidden, while a product translated in
// neither is shown. vps1 has only a French translation, so it is
// excluded from the English listing but present in the French one.
#[tokio::test]
async fn other_language_only_product_is_hidden() {
    let en = load(seeded_store(), Some(Language::En)).await;
    let en_ids: Vec<&str> = en[0].products.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(en_ids, vec!["vps2", "legacy"]);

    let fr = load(seeded_store(), Some(Language::Fr)).await;
    let fr_ids: Vec<&str> = fr[0].products.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(fr_ids, vec!["vps1", "legacy"]);
}

#[tokio::test]
async fn unsupported_language_lists_everything_with_sentinels() {
    let out = load(seeded_store(), Language::parse("de")).await;
    assert_eq!(out[0].products.len(), 3);
    assert!(out[0].products.iter().all(|p| p.usage == "N/A"));
}

#[tokio::test]
async fn manifest_document_is_skipped() {
    let store = seeded_store();
    let docs = CatalogueLoader::new(store, "catalogue")
        .load_documents(false)
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, "vps");
}

struct UnreachableStore;

#[async_trait]
impl DocumentStore for UnreachableStore {
    async fn list_documents(&self, _collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        Err(StoreError::Network("connection refused".into()))
    }

    async fn get_document(&self, _collection: &str, _id: &str) -> Result<Option<Value>, StoreError> {
        Err(StoreError::Network("connection refused".into()))
    }

    async fn put_document(&self, _collection: &str, _id: &str, _body: &Value) -> Result<(), StoreError> {
        Err(StoreError::Network("connection refused".into()))
    }
}

#[tokio::test]
async fn unreachable_store_yields_empty_catalogue_not_an_error() {
    let loader = CatalogueLoader::new(Arc::new(UnreachableStore), "catalogue");
    let out = loader.load(Some(Language::En)).await;
    assert!(out.is_empty());
}

struct CountingStore {
    inner: MemoryStore,
    lists: AtomicUsize,
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn list_documents(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        self.lists.fetch_add(1, Ordering::Relaxed);
        self.inner.list_documents(collection).await
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get_document(collection, id).await
    }

    async fn put_document(&self, collection: &str, id: &str, body: &Value) -> Result<(), StoreError> {
        self.inner.put_document(collection, id, body).await
    }
}

#[tokio::test]
async fn repeated_loads_inside_the_ttl_hit_the_cache() {
    let store = Arc::new(CountingStore { inner: MemoryStore::new(), lists: AtomicUsize::new(0) });
    store.inner.seed(
        "catalogue",
        "cdn",
        json!({"id": "cdn", "name": "CDN", "products": [], "translations": {"fr": {}, "en": {}}}),
    );
    let loader = CatalogueLoader::new(store.clone(), "catalogue");

    loader.load(Some(Language::En)).await;
    loader.load(Some(Language::Fr)).await;
    loader.load(None).await;
    assert_eq!(store.lists.load(Ordering::Relaxed), 1);

    loader.invalidate();
    loader.load(Some(Language::En)).await;
    assert_eq!(store.lists.load(Ordering::Relaxed), 2);
}

#[test]
fn enrich_is_pure_over_documents() {
    let doc: CategoryDoc = serde_json::from_value(json!({
        "id": "gpu",
        "name": "GPU",
        "products": [{"id": "gpu1", "name": "GPU 1", "hourly": 1.5}],
        "translations": {"fr": {}, "en": {"gpu1": {"usage": "training"}}}
    }))
    .unwrap();
    let out = enrich_categories(&[doc.clone()], Some(Language::En));
    assert_eq!(out[0].products.len(), 1);
    let out_fr = enrich_categories(&[doc], Some(Language::Fr));
    assert!(out_fr[0].products.is_empty());
}
