//! HTTP surface: one route group per resource kind plus a store health probe.

pub mod error;
pub mod handlers;
mod middleware;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{Router, middleware as axum_middleware, routing::get};

use self::middleware::{log_responses, set_request_context};

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route(
            "/category",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route("/category/search", get(handlers::search_categories))
        .route(
            "/category/{id}",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
        .route(
            "/products",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/products/search", get(handlers::search_products))
        .route(
            "/products/{id}",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route(
            "/variants",
            get(handlers::list_variants).post(handlers::create_variant),
        )
        .route("/variants/search", get(handlers::search_variants))
        .route(
            "/variants/{id}",
            get(handlers::get_variant)
                .put(handlers::update_variant)
                .delete(handlers::delete_variant),
        )
        .route("/health/db", get(handlers::db_health))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
