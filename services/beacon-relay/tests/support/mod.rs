//! A throwaway HTTP server standing in for the PostgREST table endpoint.

#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use beacon_relay::config::StoreConfig;
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

pub const TABLE_PATH: &str = "/rest/v1/beacon_messages";
pub const API_KEY: &str = "test-service-key";

#[derive(Clone, Default)]
pub struct FakeTable {
    pub rows: Arc<Mutex<Vec<Value>>>,
    pub last_headers: Arc<Mutex<Option<HeaderMap>>>,
    pub last_query: Arc<Mutex<Option<HashMap<String, String>>>>,
}

impl FakeTable {
    pub fn header(&self, name: &str) -> Option<String> {
        self.last_headers
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|headers| headers.get(name))
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    pub fn query(&self, name: &str) -> Option<String> {
        self.last_query
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|query| query.get(name).cloned())
    }
}

async fn insert_row(
    State(table): State<FakeTable>,
    headers: HeaderMap,
    Json(mut row): Json<Value>,
) -> impl IntoResponse {
    *table.last_headers.lock().unwrap() = Some(headers);
    let mut rows = table.rows.lock().unwrap();
    if let Some(fields) = row.as_object_mut() {
        fields.insert("id".to_string(), Value::from(rows.len() as u64 + 1));
    }
    rows.push(row.clone());
    (StatusCode::CREATED, Json(vec![row]))
}

async fn select_rows(
    State(table): State<FakeTable>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    *table.last_headers.lock().unwrap() = Some(headers);
    let limit = query
        .get("limit")
        .and_then(|limit| limit.parse::<usize>().ok())
        .unwrap_or(usize::MAX);
    *table.last_query.lock().unwrap() = Some(query);

    let mut rows = table.rows.lock().unwrap().clone();
    rows.sort_by(|a, b| {
        let a = a["received_at"].as_str().unwrap_or_default();
        let b = b["received_at"].as_str().unwrap_or_default();
        b.cmp(a)
    });
    rows.truncate(limit);
    Json(rows)
}

pub fn table_router(table: FakeTable) -> Router {
    Router::new()
        .route(TABLE_PATH, post(insert_row).get(select_rows))
        .with_state(table)
}

pub fn failing_router(status: StatusCode, body: &'static str) -> Router {
    Router::new().route(
        TABLE_PATH,
        post(move || async move { (status, body) }).get(move || async move { (status, body) }),
    )
}

pub fn slow_router(delay: Duration) -> Router {
    let respond = move || async move {
        tokio::time::sleep(delay).await;
        (StatusCode::CREATED, Json(Vec::<Value>::new()))
    };
    Router::new().route(TABLE_PATH, post(respond).get(respond))
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn store_config(base_url: &str, timeout: Duration) -> StoreConfig {
    StoreConfig {
        base_url: base_url.to_string(),
        api_key: API_KEY.to_string(),
        table: "beacon_messages".to_string(),
        timeout,
    }
}
