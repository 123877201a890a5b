use super::handlers::{actions, export, import, reviews, settings};
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

pub fn build_router(state: AppState, allowed_origins: &str) -> Router {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::PUT,
        Method::DELETE,
    ];
    let cors = if allowed_origins == "*" {
        CorsLayer::new()
            .allow_methods(methods)
            .allow_origin(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse::<HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            tracing::warn!("CORS config is invalid or empty, falling back to allow ANY.");
            CorsLayer::new()
                .allow_methods(methods)
                .allow_origin(Any)
                .allow_headers(Any)
        } else {
            tracing::info!("CORS enabled for origins: {:?}", origins);
            CorsLayer::new()
                .allow_methods(methods)
                .allow_origin(origins)
                .allow_headers(Any)
        }
    };

    Router::new()
        .route("/api/reviews", get(reviews::list_reviews))
        .route(
            "/api/reviews/:id",
            get(reviews::get_review)
                .patch(reviews::patch_review)
                .delete(reviews::delete_review),
        )
        .route("/api/reviews/:id/transition", post(actions::transition))
        .route(
            "/api/reviews/:id/delete-source",
            post(actions::delete_source),
        )
        .route(
            "/api/reviews/:id/generate-response",
            post(reviews::generate_response),
        )
        .route("/api/reviews/bulk", post(actions::bulk))
        .route("/api/pages", get(reviews::list_pages))
        .route("/api/import", post(import::run_import))
        .route("/api/track", post(import::track))
        .route("/api/export", get(export::export_json))
        .route("/api/export.csv", get(export::export_csv))
        .route(
            "/api/settings",
            get(settings::get_settings).put(settings::put_settings),
        )
        .route("/api/maintenance/purge", post(settings::purge))
        .layer(cors)
        .with_state(state)
}
