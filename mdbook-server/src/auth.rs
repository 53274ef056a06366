//! Access guard for the API routes

use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Basic, Authorization},
    TypedHeader,
};
use serde_json::json;

/// Header carrying the API key
pub const APIKEY_HEADER: &str = "mdbook_apikey";

/// Let the request through with a valid API key or administrator credentials
pub async fn require_access(
    State(state): State<AppState>,
    credentials: Option<TypedHeader<Authorization<Basic>>>,
    request: Request,
    next: Next,
) -> Response {
    let settings = &state.settings;

    let apikey_ok = settings.apikey.as_deref().is_some_and(|key| {
        request
            .headers()
            .get(APIKEY_HEADER)
            .and_then(|value| value.to_str().ok())
            == Some(key)
    });
    let basic_ok = credentials.is_some_and(|TypedHeader(auth)| {
        auth.username() == settings.user && auth.password() == settings.password
    });

    if apikey_ok || basic_ok {
        return next.run(request).await;
    }

    tracing::debug!("Denied {} {}", request.method(), request.uri().path());
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"mdbook\"")],
        Json(json!({ "error": "Authentication required" })),
    )
        .into_response()
}
