use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, StatusCode,
};
use serde_json::Value;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::BeaconMessage;

/// The remote table holding beacon messages. The store, not the relay,
/// owns the schema and assigns each row its `id`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persists one message and returns the inserted rows as the store
    /// represents them.
    async fn insert(&self, message: &BeaconMessage) -> Result<Vec<Value>, StoreError>;

    /// Returns up to `limit` rows, newest `received_at` first.
    async fn select_recent(&self, limit: i64) -> Result<Vec<Value>, StoreError>;
}

/// `id` of the first inserted row. A store that accepts the write but
/// returns nothing yields `None`, which is still a successful insert.
pub fn stored_id(rows: &[Value]) -> Option<Value> {
    rows.first()
        .and_then(|row| row.get("id"))
        .filter(|id| !id.is_null())
        .cloned()
}

/// PostgREST table endpoint (`<base>/rest/v1/<table>`) reached with the
/// project API key.
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    table_url: String,
}

impl RestStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .default_headers(default_headers(&config.api_key)?)
            .timeout(config.timeout)
            .build()
            .map_err(|err| StoreError::Transport(format!("build http client failed: {err}")))?;
        Ok(Self {
            client,
            table_url: format!("{}/rest/v1/{}", config.base_url, config.table),
        })
    }

    pub fn table_url(&self) -> &str {
        &self.table_url
    }
}

fn default_headers(api_key: &str) -> Result<HeaderMap, StoreError> {
    let invalid = |_| StoreError::Transport("api key is not a valid header value".to_string());
    let mut key = HeaderValue::from_str(api_key).map_err(invalid)?;
    key.set_sensitive(true);
    let mut bearer = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(invalid)?;
    bearer.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert("apikey", key);
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    Ok(headers)
}

async fn failure(response: reqwest::Response) -> StoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status, body = %body, "message store rejected request");
    StoreError::Status { status, body }
}

fn rows_from(body: Value) -> Vec<Value> {
    match body {
        Value::Array(rows) => rows,
        _ => Vec::new(),
    }
}

#[async_trait]
impl MessageStore for RestStore {
    async fn insert(&self, message: &BeaconMessage) -> Result<Vec<Value>, StoreError> {
        let response = self
            .client
            .post(self.table_url.as_str())
            .json(message)
            .send()
            .await?;

        if !matches!(response.status(), StatusCode::OK | StatusCode::CREATED) {
            return Err(failure(response).await);
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        let body: Value =
            serde_json::from_slice(&bytes).map_err(|err| StoreError::Decode(err.to_string()))?;
        Ok(rows_from(body))
    }

    async fn select_recent(&self, limit: i64) -> Result<Vec<Value>, StoreError> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(self.table_url.as_str())
            .query(&[
                ("order", "received_at.desc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(failure(response).await);
        }

        let body: Value = response.json().await?;
        Ok(rows_from(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn stored_id_reads_first_row() {
        let rows = vec![json!({"id": 42, "beacon_id": "B"}), json!({"id": 43})];
        assert_eq!(stored_id(&rows), Some(json!(42)));
    }

    #[test]
    fn stored_id_is_none_without_rows_or_id() {
        assert_eq!(stored_id(&[]), None);
        assert_eq!(stored_id(&[json!({"beacon_id": "B"})]), None);
        assert_eq!(stored_id(&[json!({"id": null})]), None);
    }

    #[test]
    fn table_url_joins_base_and_table() {
        let store = RestStore::new(&StoreConfig {
            base_url: "https://example.supabase.co".to_string(),
            api_key: "secret".to_string(),
            table: "beacon_messages".to_string(),
            timeout: Duration::from_secs(10),
        })
        .unwrap();
        assert_eq!(
            store.table_url(),
            "https://example.supabase.co/rest/v1/beacon_messages"
        );
    }

    #[test]
    fn non_array_bodies_decode_to_no_rows() {
        assert!(rows_from(json!({"id": 1})).is_empty());
        assert_eq!(rows_from(json!([{"id": 1}])).len(), 1);
    }

    #[test]
    fn rejects_api_key_with_control_characters() {
        let result = RestStore::new(&StoreConfig {
            base_url: "https://example.supabase.co".to_string(),
            api_key: "bad\nkey".to_string(),
            table: "beacon_messages".to_string(),
            timeout: Duration::from_secs(10),
        });
        assert!(matches!(result, Err(StoreError::Transport(_))));
    }
}
