use askama::Template;

use crate::handlers::helpers::TemplateGlobals;

// ---- view models ----

/// One product row on the listing and pricing pages, with the price
/// already formatted for the selected billing mode.
pub struct ProductRow {
    pub category_id: String,
    pub id: String,
    pub name: String,
    pub tier: String,
    pub usage: String,
    pub highlight: String,
    pub price_label: String,
}

pub struct CategoryNav {
    pub id: String,
    pub display_name: String,
    pub product_count: usize,
}

pub struct SpecRowView {
    pub name: String,
    pub value: String,
}

pub struct SectionView {
    pub title: String,
    pub specs: Vec<SpecRowView>,
}

pub struct MetricView {
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub comparison: String,
}

pub struct BlockView {
    pub title: String,
    pub items: Vec<String>,
}

pub struct ProductDetailView {
    pub id: String,
    pub name: String,
    pub tier: String,
    pub usage: String,
    pub description: String,
    pub target_audience: String,
    pub highlight: String,
    pub features: Vec<String>,
    pub use_cases: Vec<String>,
    pub price_monthly: String,
    pub price_hourly: String,
    pub price_annual: String,
    pub attributes: Vec<SpecRowView>,
    pub sections: Vec<SectionView>,
    pub benchmarks_title: String,
    pub metrics: Vec<MetricView>,
    pub security: Option<BlockView>,
    pub features_block: Option<BlockView>,
}

pub struct AdminProductRow {
    pub id: String,
    pub name: String,
    pub tier: String,
    pub price_summary: String,
    pub fr_present: bool,
    pub en_present: bool,
    pub pending: bool,
}

pub struct AdminCategoryView {
    pub id: String,
    pub display_name: String,
    pub product_count: usize,
    pub products: Vec<AdminProductRow>,
}

/// String-typed mirror of the product edit form, echoed back with the
/// user's input when validation fails.
#[derive(Default, Clone)]
pub struct ProductFormView {
    pub id: String,
    pub name: String,
    pub tier: String,
    pub monthly: String,
    pub hourly: String,
    pub annual: String,
    pub per_gb_month: String,
    /// One `key = value` attribute per line.
    pub attributes_text: String,
    pub usage_en: String,
    pub usage_fr: String,
    pub description_en: String,
    pub description_fr: String,
    pub target_audience_en: String,
    pub target_audience_fr: String,
    pub highlight_en: String,
    pub highlight_fr: String,
    /// One item per line.
    pub features_en_text: String,
    pub features_fr_text: String,
    pub use_cases_en_text: String,
    pub use_cases_fr_text: String,
    /// Structured section overrides, edited as JSON.
    pub technical_sections_json: String,
    pub benchmarks_json: String,
    pub security_json: String,
    pub features_json: String,
}

// ---- page templates ----

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub globals: TemplateGlobals,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub globals: TemplateGlobals,
    pub categories: Vec<CategoryNav>,
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub globals: TemplateGlobals,
}

#[derive(Template)]
#[template(path = "pricing.html")]
pub struct PricingTemplate {
    pub globals: TemplateGlobals,
    pub mode: String,
    pub products: Vec<ProductRow>,
}

#[derive(Template)]
#[template(path = "roadmap.html")]
pub struct RoadmapTemplate {
    pub globals: TemplateGlobals,
}

#[derive(Template)]
#[template(path = "changelog.html")]
pub struct ChangelogTemplate {
    pub globals: TemplateGlobals,
}

#[derive(Template)]
#[template(path = "support.html")]
pub struct SupportTemplate {
    pub globals: TemplateGlobals,
}

#[derive(Template)]
#[template(path = "products.html")]
pub struct ProductsPageTemplate {
    pub globals: TemplateGlobals,
    pub categories: Vec<CategoryNav>,
    pub active_category: String,
    pub sort: String,
    pub mode: String,
    pub products: Vec<ProductRow>,
    pub catalogue_empty: bool,
}

#[derive(Template)]
#[template(path = "product_detail.html")]
pub struct ProductDetailTemplate {
    pub globals: TemplateGlobals,
    pub category_id: String,
    pub product: ProductDetailView,
}

#[derive(Template)]
#[template(path = "configurator.html")]
pub struct ConfiguratorTemplate {
    pub globals: TemplateGlobals,
    pub category_id: String,
    pub product_id: String,
    pub product_name: String,
    pub mode: String,
    pub price_label: String,
}

#[derive(Template)]
#[template(path = "checkout_unavailable.html")]
pub struct CheckoutUnavailableTemplate {
    pub globals: TemplateGlobals,
}

#[derive(Template)]
#[template(path = "admin_dashboard.html")]
pub struct AdminDashboardTemplate {
    pub globals: TemplateGlobals,
    pub categories: Vec<AdminCategoryView>,
    pub pending_count: usize,
    pub has_changes: bool,
    pub save_error: Option<String>,
    pub load_error: Option<String>,
}

#[derive(Template)]
#[template(path = "admin_product_form.html")]
pub struct AdminProductFormTemplate {
    pub globals: TemplateGlobals,
    pub category_id: String,
    pub is_new: bool,
    pub form: ProductFormView,
    pub errors: Vec<String>,
}
