use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::{AppState, ProviderStatus};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub market_provider: String,
    pub providers: ProviderStatus,
}

/// GET /health -- liveness probe with key configuration
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
        market_provider: state.market.provider_name().to_string(),
        providers: state.providers,
    })
}
