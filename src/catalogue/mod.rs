//! Product catalogue: data model, read-path enrichment, and the admin
//! editing pipeline.
//!
//! The catalogue lives in a remote collection with one document per
//! category. The public storefront reads it through [`CatalogueLoader`],
//! which joins products with per-language translations behind a
//! five-minute cache. The admin panel edits it through
//! [`CatalogueEditor`], which buffers changes locally and flushes them
//! with a debounced per-category read-modify-write.

pub mod cache;
pub mod draft;
pub mod editor;
pub mod fixtures;
pub mod loader;
pub mod types;

pub use cache::TtlCache;
pub use draft::{BlockKind, ListField, ProductDraft};
pub use editor::{CatalogueEditor, PendingChange, SaveError, SaveOutcome, SaveReport};
pub use fixtures::FixturesError;
pub use loader::{enrich_categories, CatalogueLoader, EnrichedCategory, EnrichedProduct, PriceMode};
pub use types::{
    AttrValue, Benchmarks, CategoryDoc, CategoryTranslations, DisplayConfig, Language,
    LocalizedText, Pricing, Product, ProductTranslation, SectionBlock, SectionItem, SpecPair,
    TechnicalSection, TranslationPair,
};
