use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Display languages supported by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Fr,
    En,
}

impl Language {
    /// Parse a language code. Returns `None` for anything other than the
    /// two supported codes; callers degrade to sentinel content instead of
    /// erroring out.
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "fr" => Some(Language::Fr),
            "en" => Some(Language::En),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::Fr => "fr",
            Language::En => "en",
        }
    }

    /// The other supported language, used for fallback checks.
    pub fn other(&self) -> Self {
        match self {
            Language::Fr => Language::En,
            Language::En => Language::Fr,
        }
    }
}

/// Sentinel shown wherever a translatable field has no content.
pub const UNAVAILABLE: &str = "N/A";

/// Free-form product attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl AttrValue {
    pub fn display(&self) -> String {
        match self {
            AttrValue::Flag(b) => {
                if *b { "yes".into() } else { "no".into() }
            }
            AttrValue::Number(n) => {
                if n.fract() == 0.0 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            AttrValue::Text(s) => s.clone(),
        }
    }
}

/// Pricing fields. A product must carry at least one of these to be valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_gb_month: Option<f64>,
}

impl Pricing {
    pub fn has_any(&self) -> bool {
        self.monthly.is_some()
            || self.hourly.is_some()
            || self.annual.is_some()
            || self.per_gb_month.is_some()
    }
}

/// A bilingual text pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub fr: String,
}

impl LocalizedText {
    pub fn new(en: impl Into<String>, fr: impl Into<String>) -> Self {
        LocalizedText { en: en.into(), fr: fr.into() }
    }

    pub fn get(&self, lang: Language) -> &str {
        match lang {
            Language::En => &self.en,
            Language::Fr => &self.fr,
        }
    }

    pub fn set(&mut self, lang: Language, text: impl Into<String>) {
        match lang {
            Language::En => self.en = text.into(),
            Language::Fr => self.fr = text.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.en.trim().is_empty() && self.fr.trim().is_empty()
    }
}

/// A security or feature list item. Legacy documents store plain strings;
/// edited documents store a bilingual object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionItem {
    Localized { en: String, fr: String },
    Plain(String),
}

impl SectionItem {
    pub fn text(&self, lang: Language) -> &str {
        match self {
            SectionItem::Plain(s) => s,
            SectionItem::Localized { en, fr } => match lang {
                Language::En => en,
                Language::Fr => fr,
            },
        }
    }

    /// Overwrite the text for one language. A plain item is upgraded in
    /// place to a bilingual one, seeding both languages with the old
    /// string before the edited language is overwritten.
    pub fn upgrade(&mut self, lang: Language, text: impl Into<String>) {
        let text = text.into();
        match self {
            SectionItem::Localized { en, fr } => match lang {
                Language::En => *en = text,
                Language::Fr => *fr = text,
            },
            SectionItem::Plain(old) => {
                let (mut en, mut fr) = (old.clone(), old.clone());
                match lang {
                    Language::En => en = text,
                    Language::Fr => fr = text,
                }
                *self = SectionItem::Localized { en, fr };
            }
        }
    }
}

/// One name/value pair inside a technical-specification section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecPair {
    pub name: LocalizedText,
    pub value: LocalizedText,
}

/// A titled group of technical specifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSection {
    pub category: LocalizedText,
    #[serde(default)]
    pub specs: Vec<SpecPair>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkMetric {
    pub name: LocalizedText,
    #[serde(default)]
    pub value: f64,
    pub unit: LocalizedText,
    pub comparison: LocalizedText,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Benchmarks {
    pub title: LocalizedText,
    #[serde(default)]
    pub metrics: Vec<BenchmarkMetric>,
}

impl Benchmarks {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.metrics.is_empty()
    }
}

/// Security and feature blocks share this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionBlock {
    pub title: LocalizedText,
    #[serde(default)]
    pub items: Vec<SectionItem>,
}

impl SectionBlock {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.items.is_empty()
    }
}

/// A catalogue product as stored inside a category document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Pricing tier label, e.g. "standard" or "performance".
    #[serde(default)]
    pub tier: String,
    #[serde(flatten)]
    pub pricing: Pricing,
    /// Free-form spec attributes shown on the detail page.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttrValue>,
    /// Overrides for the category defaults; absent means "inherit".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_sections: Option<Vec<TechnicalSection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmarks: Option<Benchmarks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SectionBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<SectionBlock>,
}

/// Per-language marketing copy for one product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTranslation {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub usage: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_audience: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub highlight: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub use_cases: Vec<String>,
}

impl ProductTranslation {
    /// A translation counts as present only when it has real usage or
    /// description copy.
    pub fn is_present(&self) -> bool {
        !self.usage.trim().is_empty() || !self.description.trim().is_empty()
    }

    /// Drop empty strings and arrays before persistence.
    pub fn clean(mut self) -> Self {
        self.usage = self.usage.trim().to_string();
        self.description = self.description.trim().to_string();
        self.target_audience = self.target_audience.trim().to_string();
        self.highlight = self.highlight.trim().to_string();
        self.features.retain(|f| !f.trim().is_empty());
        self.use_cases.retain(|u| !u.trim().is_empty());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.usage.trim().is_empty()
            && self.description.trim().is_empty()
            && self.target_audience.trim().is_empty()
            && self.highlight.trim().is_empty()
            && self.features.iter().all(|f| f.trim().is_empty())
            && self.use_cases.iter().all(|u| u.trim().is_empty())
    }
}

/// Both languages' translation drafts for one product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationPair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fr: Option<ProductTranslation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<ProductTranslation>,
}

impl TranslationPair {
    pub fn get(&self, lang: Language) -> Option<&ProductTranslation> {
        match lang {
            Language::Fr => self.fr.as_ref(),
            Language::En => self.en.as_ref(),
        }
    }

    pub fn get_mut(&mut self, lang: Language) -> &mut ProductTranslation {
        let slot = match lang {
            Language::Fr => &mut self.fr,
            Language::En => &mut self.en,
        };
        slot.get_or_insert_with(ProductTranslation::default)
    }

    pub fn has_present(&self) -> bool {
        self.fr.as_ref().map(|t| t.is_present()).unwrap_or(false)
            || self.en.as_ref().map(|t| t.is_present()).unwrap_or(false)
    }

    /// Clean both drafts, dropping languages that end up entirely empty.
    pub fn cleaned(self) -> Self {
        let scrub = |t: Option<ProductTranslation>| {
            t.map(ProductTranslation::clean).filter(|t| !t.is_empty())
        };
        TranslationPair { fr: scrub(self.fr), en: scrub(self.en) }
    }
}

/// Category-level defaults inherited by products without overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub technical_sections: Vec<TechnicalSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmarks: Option<Benchmarks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SectionBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<SectionBlock>,
}

/// Translation maps keyed by product id, one per language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryTranslations {
    #[serde(default)]
    pub fr: BTreeMap<String, ProductTranslation>,
    #[serde(default)]
    pub en: BTreeMap<String, ProductTranslation>,
}

impl CategoryTranslations {
    pub fn for_language(&self, lang: Language) -> &BTreeMap<String, ProductTranslation> {
        match lang {
            Language::Fr => &self.fr,
            Language::En => &self.en,
        }
    }

    pub fn for_language_mut(&mut self, lang: Language) -> &mut BTreeMap<String, ProductTranslation> {
        match lang {
            Language::Fr => &mut self.fr,
            Language::En => &mut self.en,
        }
    }
}

/// One category document in the remote collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDoc {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub display_config: DisplayConfig,
    #[serde(default)]
    pub products: Vec<Product>,
    /// Stored for compatibility with existing documents; readers should
    /// treat it as derived and fall back to `products.len()`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_count: Option<usize>,
    #[serde(default)]
    pub translations: CategoryTranslations,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl CategoryDoc {
    pub fn product_count(&self) -> usize {
        self.product_count.unwrap_or(self.products.len())
    }

    pub fn find_product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}

/// The reserved manifest document, skipped when iterating the collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueManifest {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub total_products: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_published: Option<String>,
    #[serde(default)]
    pub version: u32,
}

pub const MANIFEST_DOC_ID: &str = "_manifest";

/// Fixed category ordering for the storefront and the admin panel.
/// Unknown categories sort after the known ones, alphabetically.
pub const CATEGORY_PRIORITY: &[&str] = &[
    "vps",
    "gpu",
    "webhosting",
    "paas",
    "loadbalancer",
    "storage",
    "cdn",
];

pub fn category_rank(id: &str) -> usize {
    CATEGORY_PRIORITY
        .iter()
        .position(|c| *c == id)
        .unwrap_or(CATEGORY_PRIORITY.len())
}

pub fn sort_categories(docs: &mut [CategoryDoc]) {
    docs.sort_by(|a, b| {
        category_rank(&a.id)
            .cmp(&category_rank(&b.id))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Product ids are short slugs: lowercase letters, digits, hyphens,
/// underscores.
pub fn is_valid_product_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

/// Generate a URL-safe slug from a display name.
/// Converts to lowercase, replaces spaces and special chars with `-`,
/// and trims leading/trailing dashes.
pub fn slugify(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                '-'
            }
        })
        .collect();
    slug.split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_parse_is_lenient_about_case() {
        assert_eq!(Language::parse("FR"), Some(Language::Fr));
        assert_eq!(Language::parse(" en "), Some(Language::En));
        assert_eq!(Language::parse("de"), None);
    }

    #[test]
    fn product_id_pattern() {
        assert!(is_valid_product_id("vps-2_small"));
        assert!(!is_valid_product_id(""));
        assert!(!is_valid_product_id("Invalid ID!"));
        assert!(!is_valid_product_id("UPPER"));
        assert!(!is_valid_product_id("accenté"));
    }

    #[test]
    fn category_ordering_known_before_unknown() {
        let mut docs = vec![
            CategoryDoc { id: "storage".into(), ..Default::default() },
            CategoryDoc { id: "bare-metal".into(), ..Default::default() },
            CategoryDoc { id: "vps".into(), ..Default::default() },
            CategoryDoc { id: "archive".into(), ..Default::default() },
        ];
        sort_categories(&mut docs);
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["vps", "storage", "archive", "bare-metal"]);
    }

    #[test]
    fn plain_item_upgrades_in_place() {
        let mut item = SectionItem::Plain("DDoS shield".into());
        item.upgrade(Language::Fr, "Bouclier DDoS");
        assert_eq!(
            item,
            SectionItem::Localized { en: "DDoS shield".into(), fr: "Bouclier DDoS".into() }
        );
        // A second edit only touches the edited language.
        item.upgrade(Language::En, "DDoS protection");
        assert_eq!(item.text(Language::Fr), "Bouclier DDoS");
        assert_eq!(item.text(Language::En), "DDoS protection");
    }

    #[test]
    fn translation_present_needs_usage_or_description() {
        let mut t = ProductTranslation::default();
        assert!(!t.is_present());
        t.highlight = "Best seller".into();
        assert!(!t.is_present());
        t.usage = "General purpose compute".into();
        assert!(t.is_present());
    }

    #[test]
    fn cleaned_pair_drops_empty_language() {
        let pair = TranslationPair {
            fr: Some(ProductTranslation { usage: "  ".into(), ..Default::default() }),
            en: Some(ProductTranslation {
                usage: "Edge caching".into(),
                features: vec!["".into(), "HTTP/3".into()],
                ..Default::default()
            }),
        };
        let cleaned = pair.cleaned();
        assert!(cleaned.fr.is_none());
        let en = cleaned.en.unwrap();
        assert_eq!(en.features, vec!["HTTP/3".to_string()]);
    }

    #[test]
    fn section_item_serde_accepts_both_shapes() {
        let plain: SectionItem = serde_json::from_str("\"Firewall\"").unwrap();
        assert_eq!(plain, SectionItem::Plain("Firewall".into()));
        let localized: SectionItem =
            serde_json::from_str(r#"{"en":"Firewall","fr":"Pare-feu"}"#).unwrap();
        assert_eq!(localized.text(Language::Fr), "Pare-feu");
    }

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("GPU Extreme 2"), "gpu-extreme-2");
        assert_eq!(slugify("  Load!! Balancer  "), "load-balancer");
    }
}
