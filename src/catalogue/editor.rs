use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

use crate::store::{DocumentStore, StoreError};

use super::loader::CatalogueLoader;
use super::types::{CategoryDoc, Product, ProductTranslation, TranslationPair};

/// Debounce window before an edit is flushed to the store.
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(1000);

/// One buffered edit: the product snapshot plus its translation drafts.
/// Keyed in the buffer by `categoryId:productId`.
#[derive(Debug, Clone)]
pub struct PendingChange {
    pub category_id: String,
    pub product: Product,
    pub translations: TranslationPair,
    pub is_new: bool,
}

/// Errors from flushing one category document.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Category document '{0}' not found")]
    MissingCategory(String),

    #[error("Category document '{id}' is malformed: {detail}")]
    Malformed { id: String, detail: String },

    #[error("Failed to encode category '{id}': {detail}")]
    Encode { id: String, detail: String },

    #[error("Product id '{id}' already exists in category '{category}'")]
    DuplicateId { id: String, category: String },
}

/// Per-category outcome of a save pass. Writes are one document per
/// category with no atomicity across categories, so a pass can commit
/// some categories and fail others.
#[derive(Debug, Clone, Default)]
pub struct SaveReport {
    pub committed: Vec<String>,
    pub failed: Vec<(String, String)>,
}

#[derive(Debug)]
pub enum SaveOutcome {
    /// Nothing pending; no store call was made.
    NothingToSave,
    /// Another save is in flight; this one was refused, not queued.
    AlreadySaving,
    Saved(SaveReport),
}

#[derive(Default)]
struct EditorState {
    categories: Vec<CategoryDoc>,
    pending: HashMap<String, PendingChange>,
    deletions: HashSet<String>,
    save_error: Option<String>,
    load_error: Option<String>,
}

/// Admin-side catalogue editor: the authoritative in-memory snapshot of
/// all categories plus a pending-change overlay edited optimistically
/// before a debounced flush persists it.
///
/// Saving is read-modify-write per category document: the current remote
/// document is re-read, deletions are applied to the product list and
/// both translation maps, changed products are upserted, translation
/// drafts are merged, and the whole document is written back.
pub struct CatalogueEditor {
    store: Arc<dyn DocumentStore>,
    collection: String,
    loader: Arc<CatalogueLoader>,
    state: Mutex<EditorState>,
    saving: AtomicBool,
    generation: AtomicU64,
    debounce: Duration,
}

impl CatalogueEditor {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        let collection = collection.into();
        let loader = Arc::new(CatalogueLoader::new(store.clone(), collection.clone()));
        Self::with_loader(store, collection, loader)
    }

    /// Share a loader with the public read path so a save invalidates the
    /// same cache the storefront reads from.
    pub fn with_loader(
        store: Arc<dyn DocumentStore>,
        collection: impl Into<String>,
        loader: Arc<CatalogueLoader>,
    ) -> Self {
        CatalogueEditor {
            store,
            collection: collection.into(),
            loader,
            state: Mutex::new(EditorState::default()),
            saving: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            debounce: SAVE_DEBOUNCE,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    fn key(category_id: &str, product_id: &str) -> String {
        format!("{category_id}:{product_id}")
    }

    /// Refresh the category snapshot from the store. A failure leaves the
    /// previous snapshot in place and records a retryable error string.
    pub async fn load_catalogue(&self, force: bool) {
        match self.loader.load_documents(force).await {
            Ok(docs) => {
                let mut state = self.state.lock().unwrap();
                state.categories = docs;
                state.load_error = None;
                Self::apply_overlay(&mut state);
            }
            Err(e) => {
                tracing::warn!(%e, "Catalogue load failed");
                self.state.lock().unwrap().load_error = Some(e.to_string());
            }
        }
    }

    // Re-apply the pending overlay after the snapshot is replaced, so
    // unsaved edits stay visible across reloads.
    fn apply_overlay(state: &mut EditorState) {
        let changes: Vec<PendingChange> = state.pending.values().cloned().collect();
        for change in changes {
            if let Some(doc) = state.categories.iter_mut().find(|c| c.id == change.category_id) {
                match doc.products.iter_mut().find(|p| p.id == change.product.id) {
                    Some(slot) => *slot = change.product,
                    None => doc.products.push(change.product),
                }
            }
        }
        let deletions: Vec<String> = state.deletions.iter().cloned().collect();
        for key in deletions {
            if let Some((cat, prod)) = key.split_once(':') {
                if let Some(doc) = state.categories.iter_mut().find(|c| c.id == cat) {
                    doc.products.retain(|p| p.id != prod);
                }
            }
        }
    }

    /// Current snapshot, pending overlay included.
    pub fn categories(&self) -> Vec<CategoryDoc> {
        self.state.lock().unwrap().categories.clone()
    }

    pub fn category(&self, id: &str) -> Option<CategoryDoc> {
        self.state
            .lock()
            .unwrap()
            .categories
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub fn has_changes(&self) -> bool {
        let state = self.state.lock().unwrap();
        !state.pending.is_empty() || !state.deletions.is_empty()
    }

    /// Buffered edits and deletions not yet flushed.
    pub fn pending_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.pending.len() + state.deletions.len()
    }

    pub fn save_error(&self) -> Option<String> {
        self.state.lock().unwrap().save_error.clone()
    }

    pub fn load_error(&self) -> Option<String> {
        self.state.lock().unwrap().load_error.clone()
    }

    pub fn pending_change(&self, category_id: &str, product_id: &str) -> Option<PendingChange> {
        let key = Self::key(category_id, product_id);
        self.state.lock().unwrap().pending.get(&key).cloned()
    }

    /// Buffer an edit and immediately patch the visible snapshot (append
    /// if new, replace-by-id if existing) so the UI reflects it before it
    /// is saved.
    pub fn add_to_pending_changes(
        &self,
        category_id: &str,
        product: Product,
        translations: TranslationPair,
        is_new: bool,
    ) {
        let mut state = self.state.lock().unwrap();
        if let Some(doc) = state.categories.iter_mut().find(|c| c.id == category_id) {
            match doc.products.iter_mut().find(|p| p.id == product.id) {
                Some(slot) => *slot = product.clone(),
                None => doc.products.push(product.clone()),
            }
        }
        let key = Self::key(category_id, &product.id);
        state.pending.insert(
            key,
            PendingChange { category_id: category_id.to_string(), product, translations, is_new },
        );
    }

    /// Buffer a deletion and remove the product from the visible
    /// snapshot. A product created since the last save is simply dropped
    /// from the buffer; it never existed remotely, so nothing is written
    /// for it.
    pub fn mark_for_deletion(&self, category_id: &str, product_id: &str) {
        let mut state = self.state.lock().unwrap();
        let key = Self::key(category_id, product_id);
        let was_new = state.pending.remove(&key).map(|c| c.is_new).unwrap_or(false);
        if !was_new {
            state.deletions.insert(key);
        }
        if let Some(doc) = state.categories.iter_mut().find(|c| c.id == category_id) {
            doc.products.retain(|p| p.id != product_id);
        }
    }

    /// Flush every pending change, one document write per touched
    /// category. Committed categories have their buffered state cleared;
    /// failed ones keep it so the user can retry without re-entering
    /// data. When anything committed, the read cache is invalidated and
    /// the snapshot reloaded.
    pub async fn save_all_changes(&self) -> SaveOutcome {
        if self.saving.swap(true, Ordering::SeqCst) {
            return SaveOutcome::AlreadySaving;
        }
        let outcome = self.flush().await;
        self.saving.store(false, Ordering::SeqCst);
        outcome
    }

    async fn flush(&self) -> SaveOutcome {
        let (pending, deletions) = {
            let state = self.state.lock().unwrap();
            (state.pending.clone(), state.deletions.clone())
        };
        if pending.is_empty() && deletions.is_empty() {
            return SaveOutcome::NothingToSave;
        }

        let mut by_category: BTreeMap<String, (Vec<PendingChange>, Vec<String>)> = BTreeMap::new();
        for change in pending.into_values() {
            by_category.entry(change.category_id.clone()).or_default().0.push(change);
        }
        for key in &deletions {
            if let Some((cat, prod)) = key.split_once(':') {
                by_category.entry(cat.to_string()).or_default().1.push(prod.to_string());
            }
        }

        let mut report = SaveReport::default();
        for (category_id, (upserts, removals)) in &by_category {
            match self.save_category(category_id, upserts, removals).await {
                Ok(()) => report.committed.push(category_id.clone()),
                Err(e) => {
                    tracing::warn!(%e, category = %category_id, "Category save failed");
                    report.failed.push((category_id.clone(), e.to_string()));
                }
            }
        }

        {
            let mut state = self.state.lock().unwrap();
            state.pending.retain(|_, c| !report.committed.contains(&c.category_id));
            state.deletions.retain(|key| {
                key.split_once(':')
                    .map(|(cat, _)| !report.committed.iter().any(|c| c == cat))
                    .unwrap_or(false)
            });
            state.save_error = if report.failed.is_empty() {
                None
            } else {
                Some(
                    report
                        .failed
                        .iter()
                        .map(|(cat, e)| format!("{cat}: {e}"))
                        .collect::<Vec<_>>()
                        .join("; "),
                )
            };
        }

        if !report.committed.is_empty() {
            self.loader.invalidate();
            self.load_catalogue(true).await;
        }
        SaveOutcome::Saved(report)
    }

    async fn save_category(
        &self,
        category_id: &str,
        upserts: &[PendingChange],
        removals: &[String],
    ) -> Result<(), SaveError> {
        // Re-read before writing so concurrent edits from another session
        // are not clobbered wholesale. Best effort, not a transaction.
        let current = self
            .store
            .get_document(&self.collection, category_id)
            .await?
            .ok_or_else(|| SaveError::MissingCategory(category_id.to_string()))?;
        let mut doc: CategoryDoc = serde_json::from_value(current)
            .map_err(|e| SaveError::Malformed { id: category_id.to_string(), detail: e.to_string() })?;
        if doc.id.is_empty() {
            doc.id = category_id.to_string();
        }

        for removed in removals {
            doc.products.retain(|p| p.id != *removed);
            doc.translations.fr.remove(removed);
            doc.translations.en.remove(removed);
        }

        for change in upserts {
            let existing = doc.products.iter().position(|p| p.id == change.product.id);
            if change.is_new && existing.is_some() {
                return Err(SaveError::DuplicateId {
                    id: change.product.id.clone(),
                    category: category_id.to_string(),
                });
            }
            match existing {
                Some(i) => doc.products[i] = change.product.clone(),
                None => doc.products.push(change.product.clone()),
            }
            merge_translation(&mut doc.translations.fr, &change.product.id, &change.translations.fr);
            merge_translation(&mut doc.translations.en, &change.product.id, &change.translations.en);
        }

        doc.product_count = Some(doc.products.len());
        doc.updated_at = Some(Utc::now().to_rfc3339());

        let body = serde_json::to_value(&doc)
            .map_err(|e| SaveError::Encode { id: category_id.to_string(), detail: e.to_string() })?;
        self.store.put_document(&self.collection, category_id, &body).await?;
        Ok(())
    }

    /// Debounced auto-save: waits out the debounce window and flushes
    /// unless a newer edit has reset it. Call after every buffered edit.
    pub fn schedule_save(this: &Arc<Self>) {
        if !this.has_changes() {
            return;
        }
        let generation = this.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let editor = Arc::clone(this);
        tokio::spawn(async move {
            tokio::time::sleep(editor.debounce).await;
            if editor.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            match editor.save_all_changes().await {
                SaveOutcome::Saved(report) if !report.failed.is_empty() => {
                    tracing::warn!(
                        failed = report.failed.len(),
                        "Debounced save finished with failures"
                    );
                }
                SaveOutcome::AlreadySaving => {
                    tracing::debug!("Debounced save skipped; another save in flight");
                }
                _ => {}
            }
        });
    }
}

/// Merge one language's draft into a category translation map. `None`
/// means no draft was edited, leaving the stored entry untouched; a
/// draft that cleans down to empty clears the entry.
fn merge_translation(
    map: &mut BTreeMap<String, ProductTranslation>,
    product_id: &str,
    draft: &Option<ProductTranslation>,
) {
    if let Some(t) = draft {
        let cleaned = t.clone().clean();
        if cleaned.is_empty() {
            map.remove(product_id);
        } else {
            map.insert(product_id.to_string(), cleaned);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::types::Pricing;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            "catalogue",
            "vps",
            json!({
                "id": "vps",
                "name": "VPS",
                "products": [{"id": "vps1", "name": "VPS 1", "monthly": 10.0}],
                "translations": {"fr": {"vps1": {"usage": "test"}}, "en": {}}
            }),
        );
        store.seed(
            "catalogue",
            "gpu",
            json!({
                "id": "gpu",
                "name": "GPU",
                "products": [{"id": "gpu1", "name": "GPU 1", "hourly": 1.5}],
                "translations": {
                    "fr": {"gpu1": {"usage": "calcul"}},
                    "en": {"gpu1": {"usage": "compute"}}
                }
            }),
        );
        store
    }

    fn product(id: &str, monthly: f64) -> Product {
        Product {
            id: id.into(),
            name: id.to_uppercase(),
            pricing: Pricing { monthly: Some(monthly), ..Default::default() },
            ..Default::default()
        }
    }

    fn en_usage(usage: &str) -> TranslationPair {
        TranslationPair {
            en: Some(ProductTranslation { usage: usage.into(), ..Default::default() }),
            fr: None,
        }
    }

    fn stored_doc(store: &MemoryStore, id: &str) -> CategoryDoc {
        serde_json::from_value(store.document("catalogue", id).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn save_with_no_changes_is_a_noop() {
        let store = seeded_store();
        let editor = CatalogueEditor::new(store.clone(), "catalogue");
        editor.load_catalogue(false).await;
        assert!(matches!(editor.save_all_changes().await, SaveOutcome::NothingToSave));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn round_trip_saves_cleaned_translations() {
        let store = seeded_store();
        let editor = CatalogueEditor::new(store.clone(), "catalogue");
        editor.load_catalogue(false).await;

        let translations = TranslationPair {
            en: Some(ProductTranslation {
                usage: "  Burst compute  ".into(),
                features: vec!["".into(), "NVMe".into()],
                ..Default::default()
            }),
            fr: Some(ProductTranslation::default()),
        };
        editor.add_to_pending_changes("vps", product("vps2", 20.0), translations, true);
        assert!(editor.has_changes());

        let SaveOutcome::Saved(report) = editor.save_all_changes().await else {
            panic!("expected a save pass");
        };
        assert_eq!(report.committed, vec!["vps".to_string()]);
        assert!(report.failed.is_empty());
        assert_eq!(store.write_count(), 1);

        let doc = stored_doc(&store, "vps");
        let saved = doc.find_product("vps2").expect("vps2 persisted");
        assert_eq!(saved.pricing.monthly, Some(20.0));
        let en = doc.translations.en.get("vps2").expect("en translation persisted");
        assert_eq!(en.usage, "Burst compute");
        assert_eq!(en.features, vec!["NVMe".to_string()]);
        // The empty fr draft never reaches the document.
        assert!(!doc.translations.fr.contains_key("vps2"));
        assert_eq!(doc.product_count, Some(2));

        // Snapshot was reloaded and the buffer cleared.
        assert!(!editor.has_changes());
        assert!(editor.category("vps").unwrap().find_product("vps2").is_some());

        // A second save with no new edits makes no store call.
        assert!(matches!(editor.save_all_changes().await, SaveOutcome::NothingToSave));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn created_then_deleted_is_never_written() {
        let store = seeded_store();
        let editor = CatalogueEditor::new(store.clone(), "catalogue");
        editor.load_catalogue(false).await;

        editor.add_to_pending_changes("vps", product("vps3", 30.0), en_usage("temp"), true);
        editor.mark_for_deletion("vps", "vps3");

        assert!(!editor.has_changes());
        assert!(matches!(editor.save_all_changes().await, SaveOutcome::NothingToSave));
        assert_eq!(store.write_count(), 0);
        assert!(editor.category("vps").unwrap().find_product("vps3").is_none());
    }

    #[tokio::test]
    async fn deletion_scrubs_products_and_both_translation_maps() {
        let store = seeded_store();
        let editor = CatalogueEditor::new(store.clone(), "catalogue");
        editor.load_catalogue(false).await;

        editor.mark_for_deletion("gpu", "gpu1");
        let SaveOutcome::Saved(report) = editor.save_all_changes().await else {
            panic!("expected a save pass");
        };
        assert_eq!(report.committed, vec!["gpu".to_string()]);

        let doc = stored_doc(&store, "gpu");
        assert!(doc.products.is_empty());
        assert!(!doc.translations.fr.contains_key("gpu1"));
        assert!(!doc.translations.en.contains_key("gpu1"));
        assert_eq!(doc.product_count, Some(0));
    }

    #[tokio::test]
    async fn partial_failure_keeps_failed_category_pending() {
        let store = seeded_store();
        store.fail_writes_to("gpu");
        let editor = CatalogueEditor::new(store.clone(), "catalogue");
        editor.load_catalogue(false).await;

        editor.add_to_pending_changes("vps", product("vps2", 20.0), en_usage("ok"), true);
        editor.add_to_pending_changes("gpu", product("gpu2", 99.0), en_usage("fails"), true);

        let SaveOutcome::Saved(report) = editor.save_all_changes().await else {
            panic!("expected a save pass");
        };
        assert_eq!(report.committed, vec!["vps".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "gpu");
        assert_eq!(store.write_count(), 1);

        // The gpu edit survives for retry and stays visible after the
        // post-commit reload; the vps edit is cleared.
        assert!(editor.pending_change("gpu", "gpu2").is_some());
        assert!(editor.pending_change("vps", "vps2").is_none());
        assert!(editor.save_error().unwrap().contains("gpu"));
        assert!(editor.category("gpu").unwrap().find_product("gpu2").is_some());
    }

    #[tokio::test]
    async fn duplicate_id_guard_rejects_create_at_save_time() {
        let store = seeded_store();
        let editor = CatalogueEditor::new(store.clone(), "catalogue");
        editor.load_catalogue(false).await;

        editor.add_to_pending_changes("vps", product("vps1", 50.0), en_usage("dup"), true);
        let SaveOutcome::Saved(report) = editor.save_all_changes().await else {
            panic!("expected a save pass");
        };
        assert!(report.committed.is_empty());
        assert!(report.failed[0].1.contains("already exists"));
        assert_eq!(store.write_count(), 0);
        assert!(editor.pending_change("vps", "vps1").is_some());
    }

    #[tokio::test]
    async fn debounced_edits_coalesce_into_one_save() {
        let store = seeded_store();
        let editor = Arc::new(
            CatalogueEditor::new(store.clone(), "catalogue")
                .with_debounce(Duration::from_millis(20)),
        );
        editor.load_catalogue(false).await;

        editor.add_to_pending_changes("vps", product("vps2", 20.0), en_usage("one"), true);
        CatalogueEditor::schedule_save(&editor);
        editor.add_to_pending_changes("vps", product("vps2", 25.0), en_usage("two"), false);
        CatalogueEditor::schedule_save(&editor);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(store.write_count(), 1);
        assert!(!editor.has_changes());
        let doc = stored_doc(&store, "vps");
        assert_eq!(doc.find_product("vps2").unwrap().pricing.monthly, Some(25.0));
    }
}
