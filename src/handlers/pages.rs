use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::collections::HashMap;

use crate::catalogue::PriceMode;
use crate::state::AppState;
use crate::templates::{
    AboutTemplate, CategoryNav, ChangelogTemplate, HomeTemplate, PricingTemplate, RoadmapTemplate,
    SupportTemplate,
};

use super::helpers::{build_template_globals, render_template, resolve_language};
use super::products::product_rows;

pub fn category_navs(categories: &[crate::catalogue::EnrichedCategory]) -> Vec<CategoryNav> {
    categories
        .iter()
        .map(|c| CategoryNav {
            id: c.id.clone(),
            display_name: c.display_name.clone(),
            product_count: c.product_count,
        })
        .collect()
}

pub async fn home_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(q): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let (lang, lang_code) = resolve_language(&jar, &q);
    let categories = state.loader.load(lang).await;
    let globals = build_template_globals(&state, &jar, &lang_code);
    render_template(&state, &jar, HomeTemplate { globals, categories: category_navs(&categories) })
}

pub async fn about_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(q): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let (_, lang_code) = resolve_language(&jar, &q);
    let globals = build_template_globals(&state, &jar, &lang_code);
    render_template(&state, &jar, AboutTemplate { globals })
}

pub async fn pricing_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(q): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let (lang, lang_code) = resolve_language(&jar, &q);
    let mode = q
        .get("mode")
        .and_then(|m| PriceMode::parse(m))
        .unwrap_or(PriceMode::Monthly);
    let categories = state.loader.load(lang).await;
    let products = product_rows(&categories, mode, None);
    let globals = build_template_globals(&state, &jar, &lang_code);
    render_template(
        &state,
        &jar,
        PricingTemplate { globals, mode: mode.code().to_string(), products },
    )
}

pub async fn roadmap_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(q): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let (_, lang_code) = resolve_language(&jar, &q);
    let globals = build_template_globals(&state, &jar, &lang_code);
    render_template(&state, &jar, RoadmapTemplate { globals })
}

pub async fn changelog_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(q): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let (_, lang_code) = resolve_language(&jar, &q);
    let globals = build_template_globals(&state, &jar, &lang_code);
    render_template(&state, &jar, ChangelogTemplate { globals })
}

pub async fn support_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(q): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let (_, lang_code) = resolve_language(&jar, &q);
    let globals = build_template_globals(&state, &jar, &lang_code);
    render_template(&state, &jar, SupportTemplate { globals })
}

/// Remember a display language and bounce back. Unsupported codes are
/// stored as-is; pages degrade to sentinel copy rather than rejecting
/// them.
pub async fn set_language(
    Path(code): Path<String>,
    jar: CookieJar,
    Query(q): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let mut cookie = Cookie::new("lang", code.trim().to_lowercase());
    cookie.set_path("/");
    let next = q.get("next").cloned().unwrap_or_else(|| "/".to_string());
    // Only allow local redirect targets.
    let next = if next.starts_with('/') && !next.starts_with("//") { next } else { "/".to_string() };
    (jar.add(cookie), Redirect::to(&next))
}
