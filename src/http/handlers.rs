//! # Route Handlers
//!
//! JSON endpoints over the coordinate store plus the CORS preflight.
//!
//! | Method  | Path          | Response                                   |
//! |---------|---------------|--------------------------------------------|
//! | GET     | `/gps`        | all fixes, oldest first                    |
//! | POST    | `/gps`        | `OK`, or 500 when the body is not a fix    |
//! | GET     | `/gps/latest` | most recent fix, or 404 before the first   |
//! | OPTIONS | any path      | empty body                                 |
//!
//! Handlers only touch the store; they never wait on the serial source or
//! the network watchdog.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::coordinate::Coordinate;
use crate::store::CoordinateStore;

/// Cross-origin headers attached to every response
pub const CORS_HEADERS: [(HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
];

type SharedStore = Arc<CoordinateStore>;

/// Build the application router
///
/// # Arguments
///
/// * `store` - Store read by GET and written by POST
/// * `max_body_bytes` - Largest accepted request body
pub fn router(store: SharedStore, max_body_bytes: usize) -> Router {
    Router::new()
        .route(
            "/gps",
            get(list_fixes).post(ingest_fix).options(preflight),
        )
        .route("/gps/latest", get(latest_fix).options(preflight))
        .fallback(fallback)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(store)
}

async fn list_fixes(State(store): State<SharedStore>) -> Response {
    (StatusCode::OK, CORS_HEADERS, Json(store.snapshot())).into_response()
}

async fn latest_fix(State(store): State<SharedStore>) -> Response {
    match store.latest() {
        Some(coordinate) => (StatusCode::OK, CORS_HEADERS, Json(coordinate)).into_response(),
        None => (StatusCode::NOT_FOUND, CORS_HEADERS, "No fix yet").into_response(),
    }
}

async fn ingest_fix(
    State(store): State<SharedStore>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let parsed = body
        .map_err(|rejection| rejection.body_text())
        .and_then(|bytes| {
            serde_json::from_slice::<Coordinate>(&bytes).map_err(|e| e.to_string())
        });

    match parsed {
        Ok(coordinate) => {
            store.push(coordinate);
            debug!("Stored posted fix {}", coordinate);
            (StatusCode::OK, CORS_HEADERS, "OK").into_response()
        }
        Err(reason) => {
            warn!("Rejected POST /gps body: {}", reason);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                CORS_HEADERS,
                "Invalid coordinate payload",
            )
                .into_response()
        }
    }
}

async fn preflight() -> Response {
    (StatusCode::OK, CORS_HEADERS).into_response()
}

async fn fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        preflight().await
    } else {
        (StatusCode::NOT_FOUND, CORS_HEADERS, "Not found").into_response()
    }
}
