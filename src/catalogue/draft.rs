use std::collections::BTreeMap;

use super::types::{
    is_valid_product_id, AttrValue, BenchmarkMetric, Benchmarks, CategoryDoc, DisplayConfig,
    Language, LocalizedText, Pricing, Product, SectionBlock, SectionItem, SpecPair,
    TechnicalSection, TranslationPair,
};

/// Which bilingual list field of a translation is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    Features,
    UseCases,
}

/// Security and features blocks share every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Security,
    Features,
}

/// Scratch copy of one product while it is being edited, independent of
/// the committed catalogue state.
///
/// A draft for a new product is seeded from the category's
/// `display_config` so it starts with the category's standard section
/// templates; a draft for an existing product is seeded from the
/// product's own overrides when present, else the same defaults. On
/// build, a section is stored on the product only when it is non-empty
/// and differs from the inherited default.
#[derive(Debug, Clone, Default)]
pub struct ProductDraft {
    pub is_new: bool,
    pub id: String,
    pub name: String,
    pub tier: String,
    pub pricing: Pricing,
    pub attributes: BTreeMap<String, AttrValue>,
    pub technical_sections: Vec<TechnicalSection>,
    pub benchmarks: Benchmarks,
    pub security: SectionBlock,
    pub features: SectionBlock,
    pub translations: TranslationPair,
}

impl ProductDraft {
    /// Seed a create draft from the category's shared display
    /// configuration.
    pub fn for_create(category: &CategoryDoc) -> Self {
        let defaults = &category.display_config;
        ProductDraft {
            is_new: true,
            technical_sections: defaults.technical_sections.clone(),
            benchmarks: defaults.benchmarks.clone().unwrap_or_default(),
            security: defaults.security.clone().unwrap_or_default(),
            features: defaults.features.clone().unwrap_or_default(),
            ..Default::default()
        }
    }

    /// Seed an edit draft from the product's own overrides, falling back
    /// to the category defaults for sections it inherits.
    pub fn for_edit(category: &CategoryDoc, product: &Product, translations: TranslationPair) -> Self {
        let defaults = &category.display_config;
        ProductDraft {
            is_new: false,
            id: product.id.clone(),
            name: product.name.clone(),
            tier: product.tier.clone(),
            pricing: product.pricing.clone(),
            attributes: product.attributes.clone(),
            technical_sections: product
                .technical_sections
                .clone()
                .unwrap_or_else(|| defaults.technical_sections.clone()),
            benchmarks: product
                .benchmarks
                .clone()
                .or_else(|| defaults.benchmarks.clone())
                .unwrap_or_default(),
            security: product
                .security
                .clone()
                .or_else(|| defaults.security.clone())
                .unwrap_or_default(),
            features: product
                .features
                .clone()
                .or_else(|| defaults.features.clone())
                .unwrap_or_default(),
            translations,
        }
    }

    // ---- attribute ops ----

    pub fn set_attribute(&mut self, key: impl Into<String>, value: AttrValue) {
        self.attributes.insert(key.into(), value);
    }

    pub fn remove_attribute(&mut self, key: &str) {
        self.attributes.remove(key);
    }

    /// Move an attribute to a new key, preserving its value. A missing
    /// old key is a no-op; other attributes are untouched.
    pub fn rename_attribute(&mut self, old: &str, new: impl Into<String>) {
        if let Some(value) = self.attributes.remove(old) {
            self.attributes.insert(new.into(), value);
        }
    }

    // ---- translation ops ----

    pub fn set_usage(&mut self, lang: Language, text: impl Into<String>) {
        self.translations.get_mut(lang).usage = text.into();
    }

    pub fn set_description(&mut self, lang: Language, text: impl Into<String>) {
        self.translations.get_mut(lang).description = text.into();
    }

    pub fn set_target_audience(&mut self, lang: Language, text: impl Into<String>) {
        self.translations.get_mut(lang).target_audience = text.into();
    }

    pub fn set_highlight(&mut self, lang: Language, text: impl Into<String>) {
        self.translations.get_mut(lang).highlight = text.into();
    }

    fn list_mut(&mut self, lang: Language, field: ListField) -> &mut Vec<String> {
        let t = self.translations.get_mut(lang);
        match field {
            ListField::Features => &mut t.features,
            ListField::UseCases => &mut t.use_cases,
        }
    }

    pub fn push_list_item(&mut self, lang: Language, field: ListField, text: impl Into<String>) {
        self.list_mut(lang, field).push(text.into());
    }

    pub fn update_list_item(
        &mut self,
        lang: Language,
        field: ListField,
        index: usize,
        text: impl Into<String>,
    ) {
        let list = self.list_mut(lang, field);
        if let Some(item) = list.get_mut(index) {
            *item = text.into();
        }
    }

    pub fn remove_list_item(&mut self, lang: Language, field: ListField, index: usize) {
        let list = self.list_mut(lang, field);
        if index < list.len() {
            list.remove(index);
        }
    }

    // ---- technical section ops ----

    pub fn add_section(&mut self) {
        self.technical_sections.push(TechnicalSection::default());
    }

    pub fn remove_section(&mut self, index: usize) {
        if index < self.technical_sections.len() {
            self.technical_sections.remove(index);
        }
    }

    pub fn set_section_category(&mut self, index: usize, lang: Language, text: impl Into<String>) {
        if let Some(section) = self.technical_sections.get_mut(index) {
            section.category.set(lang, text);
        }
    }

    pub fn add_section_spec(&mut self, index: usize) {
        if let Some(section) = self.technical_sections.get_mut(index) {
            section.specs.push(SpecPair::default());
        }
    }

    pub fn remove_section_spec(&mut self, section: usize, spec: usize) {
        if let Some(section) = self.technical_sections.get_mut(section) {
            if spec < section.specs.len() {
                section.specs.remove(spec);
            }
        }
    }

    pub fn set_spec_name(&mut self, section: usize, spec: usize, lang: Language, text: impl Into<String>) {
        if let Some(pair) = self
            .technical_sections
            .get_mut(section)
            .and_then(|s| s.specs.get_mut(spec))
        {
            pair.name.set(lang, text);
        }
    }

    pub fn set_spec_value(&mut self, section: usize, spec: usize, lang: Language, text: impl Into<String>) {
        if let Some(pair) = self
            .technical_sections
            .get_mut(section)
            .and_then(|s| s.specs.get_mut(spec))
        {
            pair.value.set(lang, text);
        }
    }

    // ---- benchmark ops ----

    pub fn set_benchmarks_title(&mut self, lang: Language, text: impl Into<String>) {
        self.benchmarks.title.set(lang, text);
    }

    pub fn add_metric(&mut self) {
        self.benchmarks.metrics.push(BenchmarkMetric::default());
    }

    pub fn remove_metric(&mut self, index: usize) {
        if index < self.benchmarks.metrics.len() {
            self.benchmarks.metrics.remove(index);
        }
    }

    pub fn set_metric_value(&mut self, index: usize, value: f64) {
        if let Some(metric) = self.benchmarks.metrics.get_mut(index) {
            metric.value = value;
        }
    }

    pub fn set_metric_name(&mut self, index: usize, lang: Language, text: impl Into<String>) {
        if let Some(metric) = self.benchmarks.metrics.get_mut(index) {
            metric.name.set(lang, text);
        }
    }

    pub fn set_metric_unit(&mut self, index: usize, lang: Language, text: impl Into<String>) {
        if let Some(metric) = self.benchmarks.metrics.get_mut(index) {
            metric.unit.set(lang, text);
        }
    }

    pub fn set_metric_comparison(&mut self, index: usize, lang: Language, text: impl Into<String>) {
        if let Some(metric) = self.benchmarks.metrics.get_mut(index) {
            metric.comparison.set(lang, text);
        }
    }

    // ---- security / features item ops ----

    fn block_mut(&mut self, kind: BlockKind) -> &mut SectionBlock {
        match kind {
            BlockKind::Security => &mut self.security,
            BlockKind::Features => &mut self.features,
        }
    }

    pub fn set_block_title(&mut self, kind: BlockKind, lang: Language, text: impl Into<String>) {
        self.block_mut(kind).title.set(lang, text);
    }

    pub fn add_block_item(&mut self, kind: BlockKind, text: impl Into<String>) {
        self.block_mut(kind).items.push(SectionItem::Plain(text.into()));
    }

    /// Edit one language of an item. A legacy plain-string item is
    /// upgraded to a bilingual one in place, seeded from its old text.
    pub fn update_block_item(
        &mut self,
        kind: BlockKind,
        index: usize,
        lang: Language,
        text: impl Into<String>,
    ) {
        if let Some(item) = self.block_mut(kind).items.get_mut(index) {
            item.upgrade(lang, text);
        }
    }

    pub fn remove_block_item(&mut self, kind: BlockKind, index: usize) {
        let items = &mut self.block_mut(kind).items;
        if index < items.len() {
            items.remove(index);
        }
    }

    // ---- validation ----

    /// All messages that currently block a save. Empty means the draft is
    /// savable. The duplicate-id guard for new products is checked at
    /// save time, not here.
    pub fn validate(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if !is_valid_product_id(self.id.trim()) {
            messages.push(
                "Product id must be non-empty lowercase letters, digits, hyphens or underscores"
                    .to_string(),
            );
        }
        if self.name.trim().is_empty() {
            messages.push("Product name is required".to_string());
        }
        if !self.pricing.has_any() {
            messages.push("At least one price (monthly, hourly, annual or per GB-month) is required".to_string());
        }
        if !self.translations.has_present() {
            messages.push("At least one translation needs a usage or description".to_string());
        }
        messages
    }

    pub fn can_save(&self) -> bool {
        self.validate().is_empty()
    }

    // ---- build ----

    /// Assemble the persisted product. Section blocks are attached only
    /// when non-empty and structurally different from the category's
    /// inherited defaults, so inherited boilerplate is never duplicated
    /// into the document.
    pub fn build_product(&self, defaults: &DisplayConfig) -> Product {
        let attributes: BTreeMap<String, AttrValue> = self
            .attributes
            .iter()
            .filter(|(k, v)| {
                !k.trim().is_empty()
                    && match v {
                        AttrValue::Text(s) => !s.trim().is_empty(),
                        _ => true,
                    }
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let technical_sections = Some(self.technical_sections.clone())
            .filter(|s| !s.is_empty() && *s != defaults.technical_sections);
        let benchmarks = Some(self.benchmarks.clone())
            .filter(|b| !b.is_empty() && Some(b) != defaults.benchmarks.as_ref());
        let security = Some(self.security.clone())
            .filter(|b| !b.is_empty() && Some(b) != defaults.security.as_ref());
        let features = Some(self.features.clone())
            .filter(|b| !b.is_empty() && Some(b) != defaults.features.as_ref());

        Product {
            id: self.id.trim().to_string(),
            name: self.name.trim().to_string(),
            tier: self.tier.trim().to_string(),
            pricing: self.pricing.clone(),
            attributes,
            technical_sections,
            benchmarks,
            security,
            features,
        }
    }

    /// Translation drafts with empty strings and arrays dropped, ready
    /// for the pending-change buffer.
    pub fn cleaned_translations(&self) -> TranslationPair {
        self.translations.clone().cleaned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::types::ProductTranslation;

    fn category_with_defaults() -> CategoryDoc {
        CategoryDoc {
            id: "vps".into(),
            display_config: DisplayConfig {
                technical_sections: vec![TechnicalSection {
                    category: LocalizedText::new("Compute", "Calcul"),
                    specs: vec![SpecPair {
                        name: LocalizedText::new("vCPU", "vCPU"),
                        value: LocalizedText::new("2", "2"),
                    }],
                }],
                security: Some(SectionBlock {
                    title: LocalizedText::new("Security", "Sécurité"),
                    items: vec![SectionItem::Plain("DDoS protection".into())],
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn savable_draft() -> ProductDraft {
        let mut draft = ProductDraft::for_create(&category_with_defaults());
        draft.id = "vps-4".into();
        draft.name = "VPS 4".into();
        draft.pricing.monthly = Some(12.0);
        draft.set_usage(Language::En, "General purpose compute");
        draft
    }

    #[test]
    fn create_draft_seeds_category_defaults() {
        let draft = ProductDraft::for_create(&category_with_defaults());
        assert!(draft.is_new);
        assert_eq!(draft.technical_sections.len(), 1);
        assert_eq!(draft.security.items.len(), 1);
        assert!(draft.benchmarks.is_empty());
    }

    #[test]
    fn edit_draft_prefers_product_overrides() {
        let category = category_with_defaults();
        let product = Product {
            id: "vps-1".into(),
            name: "VPS 1".into(),
            technical_sections: Some(vec![TechnicalSection {
                category: LocalizedText::new("Storage", "Stockage"),
                specs: vec![],
            }]),
            ..Default::default()
        };
        let draft = ProductDraft::for_edit(&category, &product, TranslationPair::default());
        assert_eq!(draft.technical_sections[0].category.en, "Storage");
        // Sections without an override inherit the category default.
        assert_eq!(draft.security.items.len(), 1);
    }

    #[test]
    fn rename_attribute_moves_the_value() {
        let mut draft = ProductDraft::default();
        draft.set_attribute("foo", AttrValue::Text("x".into()));
        draft.rename_attribute("foo", "bar");
        assert_eq!(draft.attributes.get("bar"), Some(&AttrValue::Text("x".into())));
        assert!(!draft.attributes.contains_key("foo"));
    }

    #[test]
    fn rename_missing_attribute_is_a_noop() {
        let mut draft = ProductDraft::default();
        draft.set_attribute("ram", AttrValue::Number(8.0));
        draft.rename_attribute("missing", "other");
        assert_eq!(draft.attributes.len(), 1);
        assert!(draft.attributes.contains_key("ram"));
    }

    #[test]
    fn validation_messages_clear_one_by_one() {
        let mut draft = ProductDraft::default();
        draft.id = "Invalid ID!".into();
        assert_eq!(draft.validate().len(), 4);
        assert!(!draft.can_save());

        draft.id = "vps-ok".into();
        draft.name = "VPS OK".into();
        assert_eq!(draft.validate().len(), 2);

        draft.pricing.hourly = Some(0.02);
        draft.set_description(Language::Fr, "Serveur virtuel");
        assert!(draft.can_save());
    }

    #[test]
    fn highlight_alone_does_not_satisfy_translation_check() {
        let mut draft = ProductDraft::default();
        draft.id = "vps-h".into();
        draft.name = "VPS H".into();
        draft.pricing.monthly = Some(5.0);
        draft.set_highlight(Language::En, "Popular");
        assert!(!draft.can_save());
    }

    #[test]
    fn build_omits_sections_equal_to_defaults() {
        let category = category_with_defaults();
        let draft = savable_draft();
        let product = draft.build_product(&category.display_config);
        // Untouched seeded sections are inherited, not stored.
        assert!(product.technical_sections.is_none());
        assert!(product.security.is_none());
        assert!(product.benchmarks.is_none());
    }

    #[test]
    fn build_keeps_sections_that_diverge() {
        let category = category_with_defaults();
        let mut draft = savable_draft();
        draft.set_spec_value(0, 0, Language::En, "4");
        draft.update_block_item(BlockKind::Security, 0, Language::Fr, "Protection DDoS");
        let product = draft.build_product(&category.display_config);
        let sections = product.technical_sections.expect("override stored");
        assert_eq!(sections[0].specs[0].value.en, "4");
        let security = product.security.expect("override stored");
        assert_eq!(
            security.items[0],
            SectionItem::Localized { en: "DDoS protection".into(), fr: "Protection DDoS".into() }
        );
    }

    #[test]
    fn build_drops_blank_attributes() {
        let mut draft = savable_draft();
        draft.set_attribute("ram_gb", AttrValue::Number(16.0));
        draft.set_attribute("notes", AttrValue::Text("  ".into()));
        draft.set_attribute("", AttrValue::Text("orphan".into()));
        let product = draft.build_product(&DisplayConfig::default());
        assert_eq!(product.attributes.len(), 1);
        assert!(product.attributes.contains_key("ram_gb"));
    }

    #[test]
    fn list_item_ops() {
        let mut draft = ProductDraft::default();
        draft.push_list_item(Language::En, ListField::Features, "NVMe storage");
        draft.push_list_item(Language::En, ListField::Features, "Snapshots");
        draft.update_list_item(Language::En, ListField::Features, 1, "Daily snapshots");
        draft.remove_list_item(Language::En, ListField::Features, 0);
        let en = draft.translations.en.as_ref().unwrap();
        assert_eq!(en.features, vec!["Daily snapshots".to_string()]);
        // Out-of-range indexes are ignored.
        draft.update_list_item(Language::En, ListField::UseCases, 3, "nope");
        draft.remove_list_item(Language::En, ListField::UseCases, 3);
    }

    #[test]
    fn cleaned_translations_drop_empty_language() {
        let mut draft = ProductDraft::default();
        draft.set_usage(Language::En, "Web hosting");
        draft.translations.fr = Some(ProductTranslation {
            features: vec!["  ".into()],
            ..Default::default()
        });
        let cleaned = draft.cleaned_translations();
        assert!(cleaned.fr.is_none());
        assert_eq!(cleaned.en.unwrap().usage, "Web hosting");
    }
}
