use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::handlers;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors_allow_any = state.config.server.cors_allow_any;

    let router = Router::new()
        // Agent endpoints
        .route(
            "/api/agents",
            get(handlers::run_agent).post(handlers::orchestrate_agents),
        )
        // LLM passthrough
        .route("/api/llm/analyze", post(handlers::analyze))
        // Market data endpoints
        .route("/api/news", get(handlers::get_news))
        .route("/api/timeseries", get(handlers::get_timeseries))
        .route("/api/quote", get(handlers::get_quote))
        .route("/api/options", get(handlers::get_options))
        // System
        .route("/health", get(handlers::health))
        .fallback(|| async { ApiError::not_found() })
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_allow_any {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router.layer(cors)
    } else {
        router
    }
}
