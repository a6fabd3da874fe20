use axum::{
    extract::{Form, Path, Query, State},
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::collections::HashMap;

use crate::catalogue::PriceMode;
use crate::notify::CheckoutRequest;
use crate::state::AppState;
use crate::templates::{CheckoutUnavailableTemplate, ConfiguratorTemplate};

use super::helpers::{build_template_globals, format_price, not_found, render_template, resolve_language};

#[derive(Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub card_expiry: String,
    #[serde(default)]
    pub card_cvc: String,
}

pub async fn configure_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Path((category_id, product_id)): Path<(String, String)>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    let (lang, lang_code) = resolve_language(&jar, &q);
    let mode = q
        .get("mode")
        .and_then(|m| PriceMode::parse(m))
        .unwrap_or(PriceMode::Monthly);
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
        ConfiguratorTemplate {
            globals,
            category_id,
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            mode: mode.code().to_string(),
            price_label: format_price(&product.pricing, mode),
        },
    )
}

/// There is no payment processor. A submit posts a notification to the
/// outbound webhook and tells the user checkout is temporarily
/// unavailable; the card fields are discarded.
pub async fn configure_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Path((category_id, product_id)): Path<(String, String)>,
    Form(form): Form<CheckoutForm>,
) -> Response {
    let categories = state.loader.load(None).await;
    let Some(product) = categories
        .iter()
        .find(|c| c.id == category_id)
        .and_then(|c| c.products.iter().find(|p| p.id == product_id))
    else {
        return not_found("Product not found");
    };

    let mode = PriceMode::parse(&form.mode).unwrap_or(PriceMode::Monthly);
    // Card data never leaves the process; only its presence is logged.
    tracing::debug!(
        has_card = !form.card_number.trim().is_empty(),
        has_expiry = !form.card_expiry.trim().is_empty(),
        has_cvc = !form.card_cvc.trim().is_empty(),
        "Discarding payment fields from checkout stub"
    );

    let request = CheckoutRequest {
        category_id: category_id.clone(),
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        billing_mode: mode.code().to_string(),
        price: mode.price(&product.pricing),
        customer_name: form.name.trim().to_string(),
        customer_email: form.email.trim().to_string(),
    };
    let notifier = state.notifier.clone();
    tokio::spawn(async move {
        notifier.send_checkout_request(&request).await;
    });

    let globals = build_template_globals(&state, &jar, "en");
    render_template(&state, &jar, CheckoutUnavailableTemplate { globals })
}
