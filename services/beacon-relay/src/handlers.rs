use axum::{
    body::Bytes,
    extract::{ConnectInfo, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use std::net::SocketAddr;

use crate::error::ServiceError;
use crate::models::{
    iso_timestamp, BeaconMessage, HealthResponse, ListParams, ListResponse, StoredResponse,
};
use crate::state::AppState;
use crate::store::stored_id;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: iso_timestamp(Utc::now()),
    })
}

pub async fn receive_beacon_data(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    body: Bytes,
) -> Response {
    let Some(mut message) = BeaconMessage::from_body(&body) else {
        tracing::warn!(source_ip = %peer.ip(), bytes = body.len(), "received empty payload");
        return ServiceError::no_data().into_response();
    };

    message.enrich(Utc::now(), peer.ip());
    tracing::info!(
        source_ip = %peer.ip(),
        payload = %serde_json::to_string(&message).unwrap_or_default(),
        "received beacon data"
    );

    match state.store.insert(&message).await {
        Ok(rows) => {
            let id = stored_id(&rows);
            if id.is_none() {
                tracing::warn!(rows = rows.len(), "message store returned no id for insert");
            }
            tracing::info!(id = ?id, "beacon data stored");
            (
                StatusCode::CREATED,
                Json(StoredResponse {
                    success: true,
                    message: "Data received and stored",
                    id,
                }),
            )
                .into_response()
        }
        Err(err) => {
            if err.is_timeout() {
                tracing::error!("message store request timed out");
            } else {
                tracing::error!(error = %err, "error processing beacon data");
            }
            ServiceError::from_insert(err).into_response()
        }
    }
}

pub async fn get_beacon_data(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let limit = ListParams::from_pairs(&pairs).limit();
    match state.store.select_recent(limit).await {
        Ok(data) => {
            tracing::debug!(limit, count = data.len(), "beacon data retrieved");
            (
                StatusCode::OK,
                Json(ListResponse {
                    success: true,
                    count: data.len(),
                    data,
                }),
            )
                .into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, limit, "error retrieving beacon data");
            ServiceError::from_select(err).into_response()
        }
    }
}
