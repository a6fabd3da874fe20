use axum::{
    extract::{Form, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::collections::HashMap;

use crate::catalogue::types::{AttrValue, Benchmarks, SectionBlock, TechnicalSection};
use crate::catalogue::{
    CatalogueEditor, CategoryDoc, Language, ProductDraft, SaveOutcome, TranslationPair,
};
use crate::state::AppState;
use crate::templates::{
    AdminCategoryView, AdminDashboardTemplate, AdminProductFormTemplate, AdminProductRow,
    ProductFormView,
};

use super::helpers::{build_template_globals, not_found, push_flash, render_template, resolve_language};

#[derive(Deserialize, Default)]
pub struct ProductForm {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub monthly: String,
    #[serde(default)]
    pub hourly: String,
    #[serde(default)]
    pub annual: String,
    #[serde(default)]
    pub per_gb_month: String,
    #[serde(default)]
    pub attributes_text: String,
    #[serde(default)]
    pub usage_en: String,
    #[serde(default)]
    pub usage_fr: String,
    #[serde(default)]
    pub description_en: String,
    #[serde(default)]
    pub description_fr: String,
    #[serde(default)]
    pub target_audience_en: String,
    #[serde(default)]
    pub target_audience_fr: String,
    #[serde(default)]
    pub highlight_en: String,
    #[serde(default)]
    pub highlight_fr: String,
    #[serde(default)]
    pub features_en_text: String,
    #[serde(default)]
    pub features_fr_text: String,
    #[serde(default)]
    pub use_cases_en_text: String,
    #[serde(default)]
    pub use_cases_fr_text: String,
    #[serde(default)]
    pub technical_sections_json: String,
    #[serde(default)]
    pub benchmarks_json: String,
    #[serde(default)]
    pub security_json: String,
    #[serde(default)]
    pub features_json: String,
}

fn price_summary(pricing: &crate::catalogue::Pricing) -> String {
    if let Some(m) = pricing.monthly {
        format!("${m:.2}/mo")
    } else if let Some(h) = pricing.hourly {
        format!("${h:.4}/hr")
    } else if let Some(a) = pricing.annual {
        format!("${a:.2}/yr")
    } else if let Some(g) = pricing.per_gb_month {
        format!("${g:.3}/GB-mo")
    } else {
        "—".to_string()
    }
}

fn dashboard_views(state: &AppState, docs: &[CategoryDoc]) -> Vec<AdminCategoryView> {
    docs.iter()
        .map(|doc| AdminCategoryView {
            id: doc.id.clone(),
            display_name: if doc.display_name.is_empty() {
                doc.name.clone()
            } else {
                doc.display_name.clone()
            },
            product_count: doc.product_count(),
            products: doc
                .products
                .iter()
                .map(|p| AdminProductRow {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    tier: p.tier.clone(),
                    price_summary: price_summary(&p.pricing),
                    fr_present: doc
                        .translations
                        .fr
                        .get(&p.id)
                        .map(|t| t.is_present())
                        .unwrap_or(false),
                    en_present: doc
                        .translations
                        .en
                        .get(&p.id)
                        .map(|t| t.is_present())
                        .unwrap_or(false),
                    pending: state.editor.pending_change(&doc.id, &p.id).is_some(),
                })
                .collect(),
        })
        .collect()
}

pub async fn dashboard_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(q): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.editor.load_catalogue(false).await;
    let docs = state.editor.categories();
    let (_, lang_code) = resolve_language(&jar, &q);
    let globals = build_template_globals(&state, &jar, &lang_code);
    render_template(
        &state,
        &jar,
        AdminDashboardTemplate {
            globals,
            categories: dashboard_views(&state, &docs),
            pending_count: state.editor.pending_count(),
            has_changes: state.editor.has_changes(),
            save_error: state.editor.save_error(),
            load_error: state.editor.load_error(),
        },
    )
}

// ---- draft <-> form plumbing ----

fn lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

fn parse_attr_value(raw: &str) -> AttrValue {
    match raw {
        "true" => AttrValue::Flag(true),
        "false" => AttrValue::Flag(false),
        _ => match raw.parse::<f64>() {
            Ok(n) => AttrValue::Number(n),
            Err(_) => AttrValue::Text(raw.to_string()),
        },
    }
}

fn parse_price(label: &str, raw: &str, errors: &mut Vec<String>) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => {
            errors.push(format!("{label} price '{raw}' is not a number"));
            None
        }
    }
}

fn parse_section_json<T: serde::de::DeserializeOwned + Default>(
    label: &str,
    raw: &str,
    errors: &mut Vec<String>,
) -> T {
    let raw = raw.trim();
    if raw.is_empty() {
        return T::default();
    }
    match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            errors.push(format!("{label} JSON is invalid: {e}"));
            T::default()
        }
    }
}

fn draft_from_form(category: &CategoryDoc, form: &ProductForm, is_new: bool) -> (ProductDraft, Vec<String>) {
    let mut errors = Vec::new();
    // Every field is overwritten from the form below; the seed only
    // matters for the sections left blank.
    let mut draft = ProductDraft::for_create(category);
    draft.is_new = is_new;

    draft.id = form.id.trim().to_lowercase();
    draft.name = form.name.clone();
    draft.tier = form.tier.clone();
    draft.pricing.monthly = parse_price("Monthly", &form.monthly, &mut errors);
    draft.pricing.hourly = parse_price("Hourly", &form.hourly, &mut errors);
    draft.pricing.annual = parse_price("Annual", &form.annual, &mut errors);
    draft.pricing.per_gb_month = parse_price("Per GB-month", &form.per_gb_month, &mut errors);

    for line in lines(&form.attributes_text) {
        match line.split_once('=') {
            Some((key, value)) => {
                draft.set_attribute(key.trim(), parse_attr_value(value.trim()));
            }
            None => errors.push(format!("Attribute line '{line}' is not 'key = value'")),
        }
    }

    for (lang, usage, description, audience, highlight, features, use_cases) in [
        (
            Language::En,
            &form.usage_en,
            &form.description_en,
            &form.target_audience_en,
            &form.highlight_en,
            &form.features_en_text,
            &form.use_cases_en_text,
        ),
        (
            Language::Fr,
            &form.usage_fr,
            &form.description_fr,
            &form.target_audience_fr,
            &form.highlight_fr,
            &form.features_fr_text,
            &form.use_cases_fr_text,
        ),
    ] {
        draft.set_usage(lang, usage.clone());
        draft.set_description(lang, description.clone());
        draft.set_target_audience(lang, audience.clone());
        draft.set_highlight(lang, highlight.clone());
        for item in lines(features) {
            draft.push_list_item(lang, crate::catalogue::ListField::Features, item);
        }
        for item in lines(use_cases) {
            draft.push_list_item(lang, crate::catalogue::ListField::UseCases, item);
        }
    }

    draft.technical_sections = parse_section_json::<Vec<TechnicalSection>>(
        "Technical sections",
        &form.technical_sections_json,
        &mut errors,
    );
    draft.benchmarks = parse_section_json::<Benchmarks>("Benchmarks", &form.benchmarks_json, &mut errors);
    draft.security = parse_section_json::<SectionBlock>("Security", &form.security_json, &mut errors);
    draft.features = parse_section_json::<SectionBlock>("Features", &form.features_json, &mut errors);

    (draft, errors)
}

fn json_or_empty<T: serde::Serialize>(value: &T, is_empty: bool) -> String {
    if is_empty {
        String::new()
    } else {
        serde_json::to_string_pretty(value).unwrap_or_default()
    }
}

// Form-facing value, chosen so `parse_attr_value` reads it back as the
// same variant ("true"/"false" for flags, not the display "yes"/"no").
fn attr_form_value(value: &AttrValue) -> String {
    match value {
        AttrValue::Flag(b) => b.to_string(),
        _ => value.display(),
    }
}

fn form_view_from_draft(draft: &ProductDraft) -> ProductFormView {
    let price = |p: Option<f64>| p.map(|v| v.to_string()).unwrap_or_default();
    let translation = |lang: Language| draft.translations.get(lang).cloned().unwrap_or_default();
    let en = translation(Language::En);
    let fr = translation(Language::Fr);
    ProductFormView {
        id: draft.id.clone(),
        name: draft.name.clone(),
        tier: draft.tier.clone(),
        monthly: price(draft.pricing.monthly),
        hourly: price(draft.pricing.hourly),
        annual: price(draft.pricing.annual),
        per_gb_month: price(draft.pricing.per_gb_month),
        attributes_text: draft
            .attributes
            .iter()
            .map(|(k, v)| format!("{k} = {}", attr_form_value(v)))
            .collect::<Vec<_>>()
            .join("\n"),
        usage_en: en.usage,
        usage_fr: fr.usage,
        description_en: en.description,
        description_fr: fr.description,
        target_audience_en: en.target_audience,
        target_audience_fr: fr.target_audience,
        highlight_en: en.highlight,
        highlight_fr: fr.highlight,
        features_en_text: en.features.join("\n"),
        features_fr_text: fr.features.join("\n"),
        use_cases_en_text: en.use_cases.join("\n"),
        use_cases_fr_text: fr.use_cases.join("\n"),
        technical_sections_json: json_or_empty(&draft.technical_sections, draft.technical_sections.is_empty()),
        benchmarks_json: json_or_empty(&draft.benchmarks, draft.benchmarks.is_empty()),
        security_json: json_or_empty(&draft.security, draft.security.is_empty()),
        features_json: json_or_empty(&draft.features, draft.features.is_empty()),
    }
}

fn stored_translations(doc: &CategoryDoc, product_id: &str) -> TranslationPair {
    TranslationPair {
        fr: doc.translations.fr.get(product_id).cloned(),
        en: doc.translations.en.get(product_id).cloned(),
    }
}

pub async fn product_new_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(category_id): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    state.editor.load_catalogue(false).await;
    let Some(doc) = state.editor.category(&category_id) else {
        return not_found("Category not found");
    };
    let draft = ProductDraft::for_create(&doc);
    let (_, lang_code) = resolve_language(&jar, &q);
    let globals = build_template_globals(&state, &jar, &lang_code);
    render_template(
        &state,
        &jar,
        AdminProductFormTemplate {
            globals,
            category_id,
            is_new: true,
            form: form_view_from_draft(&draft),
            errors: vec![],
        },
    )
}

pub async fn product_edit_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Path((category_id, product_id)): Path<(String, String)>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    state.editor.load_catalogue(false).await;
    let Some(doc) = state.editor.category(&category_id) else {
        return not_found("Category not found");
    };
    // An unsaved pending edit takes precedence over the stored document.
    let draft = if let Some(pending) = state.editor.pending_change(&category_id, &product_id) {
        ProductDraft::for_edit(&doc, &pending.product, pending.translations)
    } else {
        let Some(product) = doc.find_product(&product_id) else {
            return not_found("Product not found");
        };
        let translations = stored_translations(&doc, &product_id);
        ProductDraft::for_edit(&doc, product, translations)
    };

    let (_, lang_code) = resolve_language(&jar, &q);
    let globals = build_template_globals(&state, &jar, &lang_code);
    render_template(
        &state,
        &jar,
        AdminProductFormTemplate {
            globals,
            category_id,
            is_new: false,
            form: form_view_from_draft(&draft),
            errors: vec![],
        },
    )
}

async fn handle_product_form(
    state: AppState,
    jar: CookieJar,
    category_id: String,
    form: ProductForm,
    is_new: bool,
) -> Response {
    state.editor.load_catalogue(false).await;
    let Some(doc) = state.editor.category(&category_id) else {
        return not_found("Category not found");
    };

    let (draft, mut errors) = draft_from_form(&doc, &form, is_new);
    errors.extend(draft.validate());
    if !errors.is_empty() {
        let globals = build_template_globals(&state, &jar, "en");
        return render_template(
            &state,
            &jar,
            AdminProductFormTemplate {
                globals,
                category_id,
                is_new,
                form: form_view_from_draft(&draft),
                errors,
            },
        );
    }

    let product = draft.build_product(&doc.display_config);
    let translations = draft.cleaned_translations();
    let product_id = product.id.clone();
    state
        .editor
        .add_to_pending_changes(&category_id, product, translations, is_new);
    CatalogueEditor::schedule_save(&state.editor);
    push_flash(
        &state,
        &jar,
        format!("Product '{product_id}' queued for save in '{category_id}'"),
    );
    Redirect::to("/admin").into_response()
}

pub async fn product_create_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(category_id): Path<String>,
    Form(form): Form<ProductForm>,
) -> Response {
    handle_product_form(state, jar, category_id, form, true).await
}

pub async fn product_update_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Path((category_id, product_id)): Path<(String, String)>,
    Form(mut form): Form<ProductForm>,
) -> Response {
    // The id field is not editable on an existing product.
    form.id = product_id;
    handle_product_form(state, jar, category_id, form, false).await
}

pub async fn product_delete_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Path((category_id, product_id)): Path<(String, String)>,
) -> impl IntoResponse {
    state.editor.mark_for_deletion(&category_id, &product_id);
    CatalogueEditor::schedule_save(&state.editor);
    push_flash(&state, &jar, format!("Product '{product_id}' marked for deletion"));
    Redirect::to("/admin")
}

pub async fn save_post(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    match state.editor.save_all_changes().await {
        SaveOutcome::NothingToSave => push_flash(&state, &jar, "Nothing to save"),
        SaveOutcome::AlreadySaving => push_flash(&state, &jar, "A save is already in progress"),
        SaveOutcome::Saved(report) => {
            if report.failed.is_empty() {
                push_flash(
                    &state,
                    &jar,
                    format!("Saved {} categorie(s)", report.committed.len()),
                );
            } else {
                push_flash(
                    &state,
                    &jar,
                    format!(
                        "Saved {} categorie(s), {} failed; failed edits kept for retry",
                        report.committed.len(),
                        report.failed.len()
                    ),
                );
            }
        }
    }
    Redirect::to("/admin")
}

pub async fn reload_post(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    state.loader.invalidate();
    state.editor.load_catalogue(true).await;
    push_flash(&state, &jar, "Catalogue reloaded");
    Redirect::to("/admin")
}
