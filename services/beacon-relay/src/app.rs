use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::handlers::{get_beacon_data, health, receive_beacon_data};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/beacon/data",
            get(get_beacon_data).post(receive_beacon_data),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
