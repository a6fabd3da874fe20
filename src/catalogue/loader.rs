use std::collections::BTreeMap;
use std::sync::Arc;

use crate::store::{DocumentStore, StoreError};

use super::cache::{TtlCache, CACHE_TTL};
use super::types::{
    sort_categories, AttrValue, Benchmarks, CategoryDoc, Language, Pricing, SectionBlock,
    TechnicalSection, MANIFEST_DOC_ID, UNAVAILABLE,
};

/// A product joined with its resolved translation, ready for rendering.
#[derive(Debug, Clone)]
pub struct EnrichedProduct {
    pub id: String,
    pub name: String,
    pub tier: String,
    pub pricing: Pricing,
    pub attributes: BTreeMap<String, AttrValue>,
    /// Section content after inheritance: the product override when it has
    /// one, else the category default.
    pub technical_sections: Vec<TechnicalSection>,
    pub benchmarks: Option<Benchmarks>,
    pub security_block: Option<SectionBlock>,
    pub features_block: Option<SectionBlock>,
    pub usage: String,
    pub description: String,
    pub target_audience: String,
    pub highlight: String,
    pub features: Vec<String>,
    pub use_cases: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EnrichedCategory {
    pub id: String,
    pub display_name: String,
    pub product_count: usize,
    pub products: Vec<EnrichedProduct>,
}

/// Billing display mode on the listing and configurator pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceMode {
    Hourly,
    Monthly,
    Annual,
}

/// Hours used to convert between hourly and monthly prices.
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Discount applied when deriving an annual price from a monthly one.
pub const ANNUAL_DISCOUNT: f64 = 0.10;

impl PriceMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "hourly" => Some(PriceMode::Hourly),
            "monthly" => Some(PriceMode::Monthly),
            "annual" | "yearly" => Some(PriceMode::Annual),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            PriceMode::Hourly => "hourly",
            PriceMode::Monthly => "monthly",
            PriceMode::Annual => "annual",
        }
    }

    /// Price for this mode, derived from another mode when not stored
    /// explicitly. `None` when the product has no usable price for this
    /// mode at all.
    pub fn price(&self, pricing: &Pricing) -> Option<f64> {
        match self {
            PriceMode::Hourly => pricing
                .hourly
                .or_else(|| pricing.monthly.map(|m| m / HOURS_PER_MONTH)),
            PriceMode::Monthly => pricing
                .monthly
                .or_else(|| pricing.hourly.map(|h| h * HOURS_PER_MONTH)),
            PriceMode::Annual => pricing
                .annual
                .or_else(|| pricing.monthly.map(|m| m * 12.0 * (1.0 - ANNUAL_DISCOUNT))),
        }
    }
}

fn sentinel_fields(p: &super::types::Product, doc: &CategoryDoc) -> EnrichedProduct {
    EnrichedProduct {
        id: p.id.clone(),
        name: p.name.clone(),
        tier: p.tier.clone(),
        pricing: p.pricing.clone(),
        attributes: p.attributes.clone(),
        technical_sections: p
            .technical_sections
            .clone()
            .unwrap_or_else(|| doc.display_config.technical_sections.clone()),
        benchmarks: p
            .benchmarks
            .clone()
            .or_else(|| doc.display_config.benchmarks.clone()),
        security_block: p
            .security
            .clone()
            .or_else(|| doc.display_config.security.clone()),
        features_block: p
            .features
            .clone()
            .or_else(|| doc.display_config.features.clone()),
        usage: UNAVAILABLE.into(),
        description: UNAVAILABLE.into(),
        target_audience: UNAVAILABLE.into(),
        highlight: UNAVAILABLE.into(),
        features: Vec::new(),
        use_cases: Vec::new(),
    }
}

/// Join category documents with per-language translations.
///
/// Inclusion rule for a supported language L: a product is listed iff its
/// L translation has non-empty usage or description, OR it has no such
/// content in either language (legacy products are shown with sentinel
/// copy). A product translated only in the other language is hidden from
/// L. An unsupported language lists everything with sentinel copy.
pub fn enrich_categories(docs: &[CategoryDoc], lang: Option<Language>) -> Vec<EnrichedCategory> {
    docs.iter()
        .map(|doc| {
            let products = doc
                .products
                .iter()
                .filter_map(|p| {
                    let Some(lang) = lang else {
                        return Some(sentinel_fields(p, doc));
                    };
                    let current = doc.translations.for_language(lang).get(&p.id);
                    let other = doc.translations.for_language(lang.other()).get(&p.id);
                    let has_current = current.map(|t| t.is_present()).unwrap_or(false);
                    let has_other = other.map(|t| t.is_present()).unwrap_or(false);

                    if has_current {
                        let t = current.unwrap();
                        let mut enriched = sentinel_fields(p, doc);
                        let text = |s: &str| {
                            if s.trim().is_empty() { UNAVAILABLE.to_string() } else { s.to_string() }
                        };
                        enriched.usage = text(&t.usage);
                        enriched.description = text(&t.description);
                        enriched.target_audience = text(&t.target_audience);
                        enriched.highlight = text(&t.highlight);
                        enriched.features = t.features.clone();
                        enriched.use_cases = t.use_cases.clone();
                        Some(enriched)
                    } else if !has_other {
                        // Untranslated in both languages: legacy fallback.
                        Some(sentinel_fields(p, doc))
                    } else {
                        None
                    }
                })
                .collect::<Vec<_>>();
            EnrichedCategory {
                id: doc.id.clone(),
                display_name: if doc.display_name.is_empty() {
                    doc.name.clone()
                } else {
                    doc.display_name.clone()
                },
                product_count: doc.product_count(),
                products,
            }
        })
        .collect()
}

/// Read-path loader: fetches category documents (through a five-minute
/// cache) and serves the enriched join.
pub struct CatalogueLoader {
    store: Arc<dyn DocumentStore>,
    collection: String,
    cache: TtlCache,
}

impl CatalogueLoader {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self::with_cache(store, collection, TtlCache::new(CACHE_TTL))
    }

    pub fn with_cache(
        store: Arc<dyn DocumentStore>,
        collection: impl Into<String>,
        cache: TtlCache,
    ) -> Self {
        CatalogueLoader { store, collection: collection.into(), cache }
    }

    /// Enriched catalogue for a display language. Never errors: when the
    /// store is unreachable this returns an empty list, which callers must
    /// render as "unknown", not "no products".
    pub async fn load(&self, lang: Option<Language>) -> Vec<EnrichedCategory> {
        match self.load_documents(false).await {
            Ok(docs) => enrich_categories(&docs, lang),
            Err(e) => {
                tracing::warn!(%e, "Catalogue load failed; serving empty catalogue");
                Vec::new()
            }
        }
    }

    /// Raw category documents, cache-first unless forced. The cache is a
    /// single shared slot, not per-language.
    pub async fn load_documents(&self, force: bool) -> Result<Vec<CategoryDoc>, StoreError> {
        if !force {
            if let Some(cached) = self.cache.get() {
                if let Ok(docs) = serde_json::from_value::<Vec<CategoryDoc>>(cached) {
                    return Ok(docs);
                }
            }
        }
        let raw = self.store.list_documents(&self.collection).await?;
        let mut docs = Vec::with_capacity(raw.len());
        for (id, body) in raw {
            if id == MANIFEST_DOC_ID {
                continue;
            }
            match serde_json::from_value::<CategoryDoc>(body) {
                Ok(mut doc) => {
                    if doc.id.is_empty() {
                        doc.id = id;
                    }
                    docs.push(doc);
                }
                Err(e) => {
                    tracing::warn!(%e, document = %id, "Skipping malformed category document");
                }
            }
        }
        sort_categories(&mut docs);
        if let Ok(value) = serde_json::to_value(&docs) {
            self.cache.put(&value);
        }
        Ok(docs)
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
    }
}
