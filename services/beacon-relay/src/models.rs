use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::net::IpAddr;

pub const DEFAULT_LIMIT: i64 = 100;

/// A beacon reading as posted by the device, with the two fields the relay
/// adds on receipt. Caller fields keep their order and are never inspected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BeaconMessage(Map<String, Value>);

impl BeaconMessage {
    pub const RECEIVED_AT: &'static str = "received_at";
    pub const SOURCE_IP: &'static str = "source_ip";

    /// Accepts only a body that parses to a JSON object with at least one
    /// field. Empty bodies, malformed JSON, `null`, `{}` and non-objects are
    /// all treated as "no data".
    pub fn from_body(body: &[u8]) -> Option<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        match serde_json::from_slice::<Value>(body).ok()? {
            Value::Object(fields) if !fields.is_empty() => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn enrich(&mut self, received_at: DateTime<Utc>, source_ip: IpAddr) {
        self.0
            .insert(Self::RECEIVED_AT.to_string(), Value::String(iso_timestamp(received_at)));
        self.0
            .insert(Self::SOURCE_IP.to_string(), Value::String(source_ip.to_string()));
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub struct ListParams {
    pub limit: Option<String>,
}

impl ListParams {
    /// Takes the first `limit` pair when the query repeats it.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            limit: pairs
                .iter()
                .find(|(key, _)| key == "limit")
                .map(|(_, value)| value.clone()),
        }
    }

    /// Unparseable values fall back to the default; any integer, including
    /// zero or negative, is left for the store to interpret.
    pub fn limit(&self) -> i64 {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_LIMIT)
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct StoredResponse {
    pub success: bool,
    pub message: &'static str,
    pub id: Option<Value>,
}

#[derive(Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub success: bool,
}
