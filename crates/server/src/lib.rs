//! Campus API library.
//!
//! JSON API over users, courses and enrollments. The binary in `main.rs`
//! wires configuration, the store backend and the session store into
//! [`build_app`]; tests build the same router over the in-memory backends.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
mod testing;

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, Method, header},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tower_sessions::SessionStore;

use crate::state::AppState;

/// Build the application router with every middleware layer applied.
///
/// Layers run outermost first: Sentry, CORS, tracing, request id, sessions.
pub fn build_app<S>(state: AppState, sessions: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = middleware::create_session_layer(sessions, state.config());

    let origin = state.config().cors_origin.parse::<HeaderValue>().ok();
    if origin.is_none() {
        tracing::warn!(
            origin = %state.config().cors_origin,
            "Invalid CORS origin, cross-origin requests will be rejected"
        );
    }
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origin))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    routes::routes()
        .layer(session_layer)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(trace)
        .layer(cors)
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
