use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::catalogue::{EnrichedCategory, EnrichedProduct, Language, PriceMode};
use crate::state::AppState;
use crate::templates::{
    BlockView, MetricView, ProductDetailTemplate, ProductDetailView, ProductRow,
    ProductsPageTemplate, SectionView, SpecRowView,
};

use super::helpers::{build_template_globals, format_price, not_found, render_template, resolve_language};
use super::pages::category_navs;

pub(crate) fn product_rows(
    categories: &[EnrichedCategory],
    mode: PriceMode,
    category_filter: Option<&str>,
) -> Vec<ProductRow> {
    categories
        .iter()
        .filter(|c| category_filter.map(|f| c.id == f).unwrap_or(true))
        .flat_map(|c| {
            c.products.iter().map(|p| ProductRow {
                category_id: c.id.clone(),
                id: p.id.clone(),
                name: p.name.clone(),
                tier: p.tier.clone(),
                usage: p.usage.clone(),
                highlight: p.highlight.clone(),
                price_label: format_price(&p.pricing, mode),
            })
        })
        .collect()
}

fn sort_products(categories: &mut [EnrichedCategory], sort: &str, mode: PriceMode) {
    let by_price = |a: &EnrichedProduct, b: &EnrichedProduct| {
        // Unpriced products sort to the end either way.
        match (mode.price(&a.pricing), mode.price(&b.pricing)) {
            (Some(pa), Some(pb)) => pa.partial_cmp(&pb).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    };
    for category in categories {
        match sort {
            "price-desc" => category.products.sort_by(|a, b| by_price(b, a)),
            "name" => category.products.sort_by(|a, b| a.name.cmp(&b.name)),
            _ => category.products.sort_by(by_price),
        }
    }
}

pub async fn products_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(q): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let (lang, lang_code) = resolve_language(&jar, &q);
    let mode = q
        .get("mode")
        .and_then(|m| PriceMode::parse(m))
        .unwrap_or(PriceMode::Monthly);
    let sort = q.get("sort").cloned().unwrap_or_else(|| "price-asc".to_string());
    let active_category = q.get("category").cloned().unwrap_or_default();

    let mut categories = state.loader.load(lang).await;
    // An empty result means the store was unreachable, not an empty
    // catalogue; the page says so instead of showing zero products.
    let catalogue_empty = categories.is_empty();
    sort_products(&mut categories, &sort, mode);
    let filter = Some(active_category.as_str()).filter(|c| !c.is_empty());
    let products = product_rows(&categories, mode, filter);

    let globals = build_template_globals(&state, &jar, &lang_code);
    render_template(
        &state,
        &jar,
        ProductsPageTemplate {
            globals,
            categories: category_navs(&categories),
            active_category,
            sort,
            mode: mode.code().to_string(),
            products,
            catalogue_empty,
        },
    )
}

fn detail_view(product: &EnrichedProduct, lang: Option<Language>) -> ProductDetailView {
    // Section copy has no sentinel path; it falls back to English for
    // unsupported languages.
    let text_lang = lang.unwrap_or(Language::En);
    ProductDetailView {
        id: product.id.clone(),
        name: product.name.clone(),
        tier: product.tier.clone(),
        usage: product.usage.clone(),
        description: product.description.clone(),
        target_audience: product.target_audience.clone(),
        highlight: product.highlight.clone(),
        features: product.features.clone(),
        use_cases: product.use_cases.clone(),
        price_monthly: format_price(&product.pricing, PriceMode::Monthly),
        price_hourly: format_price(&product.pricing, PriceMode::Hourly),
        price_annual: format_price(&product.pricing, PriceMode::Annual),
        attributes: product
            .attributes
            .iter()
            .map(|(k, v)| SpecRowView { name: k.clone(), value: v.display() })
            .collect(),
        sections: product
            .technical_sections
            .iter()
            .map(|s| SectionView {
                title: s.category.get(text_lang).to_string(),
                specs: s
                    .specs
                    .iter()
                    .map(|p| SpecRowView {
                        name: p.name.get(text_lang).to_string(),
                        value: p.value.get(text_lang).to_string(),
                    })
                    .collect(),
            })
            .collect(),
        benchmarks_title: product
            .benchmarks
            .as_ref()
            .map(|b| b.title.get(text_lang).to_string())
            .unwrap_or_default(),
        metrics: product
            .benchmarks
            .as_ref()
            .map(|b| {
                b.metrics
                    .iter()
                    .map(|m| MetricView {
                        name: m.name.get(text_lang).to_string(),
                        value: m.value,
                        unit: m.unit.get(text_lang).to_string(),
                        comparison: m.comparison.get(text_lang).to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        security: product.security_block.as_ref().map(|b| BlockView {
            title: b.title.get(text_lang).to_string(),
            items: b.items.iter().map(|i| i.text(text_lang).to_string()).collect(),
        }),
        features_block: product.features_block.as_ref().map(|b| BlockView {
            title: b.title.get(text_lang).to_string(),
            items: b.items.iter().map(|i| i.text(text_lang).to_string()).collect(),
        }),
    }
}

pub async fn product_detail_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Path((category_id, product_id)): Path<(String, String)>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    let (lang, lang_code) = resolve_language(&jar, &q);
    let categories = state.loader.load(lang).await;
    let Some(product) = categories
        .iter()
        .find(|c| c.id == category_id)
        .and_then(|c| c.products.iter().find(|p| p.id == product_id))
    else {
        return not_found("Product not found");
    };

    let globals = build_template_globals(&state, &jar, &lang_code);
    render_template(
        &state,
        &jar,
        ProductDetailTemplate { globals, category_id, product: detail_view(product, lang) },
    )
}
