//! API route definitions.

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::auth::basic_auth_middleware;

use super::handlers;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let auth_state = state.auth.clone();

    let protected_routes = Router::new()
        .route(
            "/workstations",
            get(handlers::list_workstations).post(handlers::create_workstation),
        )
        .route("/workstations/{name}", delete(handlers::delete_workstation))
        .route(
            "/workstations/{name}/attach",
            get(handlers::attach_workstation),
        )
        .route("/workstations/{name}/add-key", post(handlers::add_key))
        .layer(middleware::from_fn_with_state(
            auth_state,
            basic_auth_middleware,
        ))
        .with_state(state);

    let public_routes = Router::new().route("/health", get(handlers::health));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
}
