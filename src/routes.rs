use axum::http::header::CACHE_CONTROL;
use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::handlers;
use crate::state::AppState;

// Embed the default stylesheet in the binary
const DEFAULT_STYLESHEET: &str = include_str!("../static/styles.css");

pub fn build_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/admin", get(handlers::admin::dashboard_get))
        .route("/admin/save", post(handlers::admin::save_post))
        .route("/admin/reload", post(handlers::admin::reload_post))
        .route(
            "/admin/catalogue/:category/new",
            get(handlers::admin::product_new_get).post(handlers::admin::product_create_post),
        )
        .route(
            "/admin/catalogue/:category/:id",
            get(handlers::admin::product_edit_get).post(handlers::admin::product_update_post),
        )
        .route(
            "/admin/catalogue/:category/:id/delete",
            post(handlers::admin::product_delete_post),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            handlers::middleware::auth_middleware,
        ));

    // Always serve styles.css - use custom if provided, otherwise use
    // the embedded default
    let stylesheet_content = state
        .custom_css
        .clone()
        .unwrap_or_else(|| DEFAULT_STYLESHEET.to_string());

    Router::new()
        .route("/", get(handlers::pages::home_get))
        .route("/about", get(handlers::pages::about_get))
        .route("/pricing", get(handlers::pages::pricing_get))
        .route("/roadmap", get(handlers::pages::roadmap_get))
        .route("/changelog", get(handlers::pages::changelog_get))
        .route("/support", get(handlers::pages::support_get))
        .route("/products", get(handlers::products::products_get))
        .route("/products/:category/:id", get(handlers::products::product_detail_get))
        .route(
            "/configure/:category/:id",
            get(handlers::configurator::configure_get).post(handlers::configurator::configure_post),
        )
        .route("/lang/:code", get(handlers::pages::set_language))
        .route("/login", get(handlers::auth::login_get).post(handlers::auth::login_post))
        .route("/logout", post(handlers::auth::logout_post))
        .route(
            "/static/styles.css",
            get(move || {
                let css = stylesheet_content.clone();
                async move { ([(axum::http::header::CONTENT_TYPE, "text/css")], css) }
            }),
        )
        .merge(admin_routes)
        .nest_service(
            "/static",
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::if_not_present(
                    CACHE_CONTROL,
                    HeaderValue::from_static("public, max-age=31536000, immutable"),
                ))
                .service(ServeDir::new("static")),
        )
        .with_state(state)
}
