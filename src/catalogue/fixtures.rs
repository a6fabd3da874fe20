use futures_util::future::join_all;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::store::MemoryStore;

use super::types::{
    sort_categories, CategoryDoc, DisplayConfig, Language, Product, ProductTranslation,
};

/// Base product list file inside the fixtures directory.
pub const PRODUCTS_FILE: &str = "products.json";

#[derive(Debug, Error)]
pub enum FixturesError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One category in `products.json`, before translations are merged in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BaseCategory {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    display_config: DisplayConfig,
    #[serde(default)]
    products: Vec<Product>,
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, FixturesError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FixturesError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_str(&text)
        .map_err(|source| FixturesError::Parse { path: path.to_path_buf(), source })
}

// Missing translation files are normal (not every category is translated
// in every language); unreadable ones are logged and treated as empty.
async fn read_translation_map(path: PathBuf) -> BTreeMap<String, ProductTranslation> {
    match tokio::fs::read_to_string(&path).await {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(%e, path = %path.display(), "Skipping malformed translation file");
                BTreeMap::new()
            }
        },
        Err(_) => BTreeMap::new(),
    }
}

/// Load the static catalogue: `products.json` joined with
/// `translations/{lang}/{category}.json` for both supported languages.
pub async fn load_categories(dir: &Path) -> Result<Vec<CategoryDoc>, FixturesError> {
    let base: Vec<BaseCategory> = read_json(&dir.join(PRODUCTS_FILE)).await?;

    let translation_path = |lang: Language, category: &str| {
        dir.join("translations").join(lang.code()).join(format!("{category}.json"))
    };

    let fr_maps = join_all(
        base.iter().map(|c| read_translation_map(translation_path(Language::Fr, &c.id))),
    )
    .await;
    let en_maps = join_all(
        base.iter().map(|c| read_translation_map(translation_path(Language::En, &c.id))),
    )
    .await;

    let mut docs: Vec<CategoryDoc> = base
        .into_iter()
        .zip(fr_maps.into_iter().zip(en_maps))
        .map(|(category, (fr, en))| {
            let mut doc = CategoryDoc {
                id: category.id,
                name: category.name,
                display_name: category.display_name,
                display_config: category.display_config,
                products: category.products,
                ..Default::default()
            };
            doc.product_count = Some(doc.products.len());
            doc.translations.fr = fr;
            doc.translations.en = en;
            doc
        })
        .collect();
    sort_categories(&mut docs);
    Ok(docs)
}

/// Seed an in-memory store with the fixture catalogue, one document per
/// category. Lets the server run against static files when no remote
/// store is configured.
pub async fn seed_store(dir: &Path, collection: &str) -> Result<MemoryStore, FixturesError> {
    let docs = load_categories(dir).await?;
    let store = MemoryStore::new();
    for doc in &docs {
        match serde_json::to_value(doc) {
            Ok(body) => store.seed(collection, &doc.id, body),
            Err(e) => tracing::warn!(%e, category = %doc.id, "Skipping unencodable fixture"),
        }
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_fixtures(dir: &Path) {
        fs::write(
            dir.join(PRODUCTS_FILE),
            serde_json::json!([
                {
                    "id": "storage",
                    "name": "Storage",
                    "products": [{"id": "block-100", "name": "Block 100", "perGbMonth": 0.04}]
                },
                {
                    "id": "vps",
                    "name": "VPS",
                    "products": [{"id": "vps1", "name": "VPS 1", "monthly": 10.0}]
                }
            ])
            .to_string(),
        )
        .unwrap();
        fs::create_dir_all(dir.join("translations/fr")).unwrap();
        fs::create_dir_all(dir.join("translations/en")).unwrap();
        fs::write(
            dir.join("translations/fr/vps.json"),
            serde_json::json!({"vps1": {"usage": "Serveur virtuel"}}).to_string(),
        )
        .unwrap();
        fs::write(dir.join("translations/en/storage.json"), "{not json").unwrap();
    }

    #[tokio::test]
    async fn loads_and_sorts_categories_with_translations() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());

        let docs = load_categories(dir.path()).await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["vps", "storage"]);
        assert_eq!(docs[0].translations.fr.get("vps1").unwrap().usage, "Serveur virtuel");
        // A missing translation file reads as an empty map.
        assert!(docs[0].translations.en.is_empty());
        // A malformed one does too.
        assert!(docs[1].translations.en.is_empty());
        assert_eq!(docs[1].product_count, Some(1));
    }

    #[tokio::test]
    async fn missing_base_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_categories(dir.path()).await.unwrap_err();
        assert!(matches!(err, FixturesError::Io { .. }));
    }

    #[tokio::test]
    async fn seeded_store_serves_category_documents() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());

        let store = seed_store(dir.path(), "catalogue").await.unwrap();
        let doc = store.document("catalogue", "vps").expect("vps seeded");
        assert_eq!(doc["products"][0]["id"], "vps1");
    }
}
