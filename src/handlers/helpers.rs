use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use std::collections::HashMap;

use crate::catalogue::types::UNAVAILABLE;
use crate::catalogue::{Language, PriceMode, Pricing};
use crate::state::AppState;

pub fn session_id_from_jar(jar: &CookieJar) -> Option<String> {
    jar.get("session_id").map(|c| c.value().to_string())
}

pub fn current_username_from_jar(state: &AppState, jar: &CookieJar) -> Option<String> {
    let sid = session_id_from_jar(jar)?;
    state.sessions.lock().unwrap().get(&sid).cloned()
}

pub fn take_flash_messages(state: &AppState, jar: &CookieJar) -> Vec<String> {
    let Some(sid) = session_id_from_jar(jar) else {
        return vec![];
    };
    let mut fs = state.flash_store.lock().unwrap();
    fs.remove(&sid).unwrap_or_default()
}

pub fn push_flash(state: &AppState, jar: &CookieJar, message: impl Into<String>) {
    if let Some(sid) = session_id_from_jar(jar) {
        state
            .flash_store
            .lock()
            .unwrap()
            .entry(sid)
            .or_default()
            .push(message.into());
    }
}

/// Display language for a request: `?lang=` wins, then the `lang`
/// cookie, then English. Unknown codes are carried through so pages can
/// degrade to sentinel content instead of erroring.
pub fn resolve_language(jar: &CookieJar, query: &HashMap<String, String>) -> (Option<Language>, String) {
    let code = query
        .get("lang")
        .cloned()
        .or_else(|| jar.get("lang").map(|c| c.value().to_string()))
        .unwrap_or_else(|| "en".to_string());
    let code = code.trim().to_lowercase();
    (Language::parse(&code), code)
}

#[derive(Default, Clone)]
pub struct TemplateGlobals {
    pub current_user: Option<String>,
    pub lang: String,
    pub other_lang: String,
    pub base_url: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
}

pub fn build_template_globals(state: &AppState, jar: &CookieJar, lang_code: &str) -> TemplateGlobals {
    let current_user = current_username_from_jar(state, jar);
    let flash_messages = take_flash_messages(state, jar);
    let has_flash_messages = !flash_messages.is_empty();
    let other_lang = match Language::parse(lang_code) {
        Some(lang) => lang.other().code().to_string(),
        None => "en".to_string(),
    };
    TemplateGlobals {
        current_user,
        lang: lang_code.to_string(),
        other_lang,
        base_url: state.public_base_url.clone(),
        flash_messages,
        has_flash_messages,
    }
}

pub fn inject_context(state: &AppState, jar: &CookieJar, mut html: String) -> Response {
    // Inject a global context object into the HTML for client-side
    // scripts.
    let context = serde_json::json!({
        "baseUrl": state.public_base_url,
        "currentUser": current_username_from_jar(state, jar),
    });
    let context_str = serde_json::to_string(&context).unwrap_or_else(|_| "{}".into());
    let inject = format!(r#"<script>window.__APP_CONTEXT__ = {};</script></body>"#, context_str);
    html = html.replace("</body>", &inject);
    Html(html).into_response()
}

pub fn render_template<T: askama::Template>(state: &AppState, jar: &CookieJar, t: T) -> Response {
    match t.render() {
        Ok(body) => inject_context(state, jar, body),
        Err(e) => {
            tracing::error!(%e, "Template render error");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

pub fn ensure_logged_in(state: &AppState, jar: &CookieJar) -> Option<Redirect> {
    if current_username_from_jar(state, jar).is_none() {
        return Some(Redirect::to("/login"));
    }
    None
}

pub fn not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(format!("<!DOCTYPE html><html><body><p>{}</p></body></html>", message)),
    )
        .into_response()
}

/// Price for the selected billing mode, formatted for display. Products
/// without a usable price in that mode show the sentinel.
pub fn format_price(pricing: &Pricing, mode: PriceMode) -> String {
    match mode.price(pricing) {
        Some(p) => format!("${p:.2}"),
        None => UNAVAILABLE.to_string(),
    }
}
