//! API routes

use crate::auth::require_access;
use crate::handlers;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

/// CORS from the configured origins; permissive in development mode
fn cors_layer(state: &AppState) -> CorsLayer {
    let settings = &state.settings;
    match settings.cors_origins.as_deref() {
        Some("*") => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        Some(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed))
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None if settings.development => CorsLayer::permissive(),
        None => CorsLayer::new(),
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state);

    let api_routes = Router::new()
        .route("/state", get(handlers::site_state))
        // Books
        .route("/books", get(handlers::list_books).post(handlers::create_book))
        .route(
            "/books/:bid",
            get(handlers::get_book).delete(handlers::delete_book),
        )
        .route("/books/:bid/copy", post(handlers::copy_book))
        .route("/books/:bid/reload", post(handlers::reload_book))
        .route("/books/:bid/index", get(handlers::term_index))
        .route("/books/:bid/search", get(handlers::search_book))
        .route("/books/:bid/archive", get(handlers::archive_book))
        .route("/books/:bid/download", get(handlers::download_book))
        // Items
        .route("/books/:bid/sections", post(handlers::create_section))
        .route("/books/:bid/texts", post(handlers::create_text))
        .route(
            "/books/:bid/items/*path",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route("/books/:bid/move/*path", post(handlers::move_item))
        .route("/books/:bid/copy/*path", post(handlers::copy_item))
        .route("/books/:bid/to-section/*path", post(handlers::to_section))
        // References
        .route(
            "/references",
            get(handlers::list_references).post(handlers::create_reference),
        )
        .route(
            "/references/:refid",
            get(handlers::get_reference).delete(handlers::delete_reference),
        )
        // SSE endpoint
        .route("/sync", get(handlers::sync_events))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_access));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
