use axum::{
    extract::{Form, Query, State},
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use std::collections::HashMap;

use crate::auth::{random_session_id, verify_password};
use crate::state::AppState;
use crate::templates::LoginTemplate;

use super::helpers::{
    build_template_globals, current_username_from_jar, render_template, resolve_language,
};

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn login_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(q): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if current_username_from_jar(&state, &jar).is_some() {
        return Redirect::to("/admin").into_response();
    }
    let (_, lang_code) = resolve_language(&jar, &q);
    let globals = build_template_globals(&state, &jar, &lang_code);
    render_template(&state, &jar, LoginTemplate { globals, error: None })
}

pub async fn login_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> impl IntoResponse {
    let uname = form.username.trim().to_lowercase();
    if uname == state.admin_username && verify_password(&state.admin_password_hash, &form.password) {
        let sid = random_session_id();
        state.sessions.lock().unwrap().insert(sid.clone(), uname);
        let mut cookie = Cookie::new("session_id", sid);
        cookie.set_path("/");
        cookie.set_http_only(true);
        return (jar.add(cookie), Redirect::to("/admin")).into_response();
    }
    let globals = build_template_globals(&state, &jar, "en");
    render_template(
        &state,
        &jar,
        LoginTemplate { globals, error: Some("Invalid credentials".into()) },
    )
}

pub async fn logout_post(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(sid) = jar.get("session_id").map(|c| c.value().to_string()) {
        state.sessions.lock().unwrap().remove(&sid);
    }
    let cleared = jar.remove(Cookie::new("session_id", ""));
    (cleared, Redirect::to("/")).into_response()
}
