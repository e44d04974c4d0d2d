use beacon_common::env_or;
use chrono::{SecondsFormat, Utc};
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Clone)]
struct SimulatorConfig {
    relay_url: String,
    send_interval: Duration,
    request_timeout: Duration,
    beacon_count: u32,
}

impl SimulatorConfig {
    fn from_env() -> Self {
        let relay_url = std::env::var("RELAY_URL")
            .unwrap_or_else(|_| "http://localhost:5000".to_string())
            .trim_end_matches('/')
            .to_string();
        Self {
            relay_url,
            send_interval: Duration::from_secs(env_or("SEND_INTERVAL_SECS", 5u64)),
            request_timeout: Duration::from_secs(env_or("REQUEST_TIMEOUT_SECS", 5u64)),
            beacon_count: env_or("BEACON_COUNT", 3u32).max(1),
        }
    }

    fn data_url(&self) -> String {
        format!("{}/beacon/data", self.relay_url)
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.relay_url)
    }
}

#[derive(Debug, Serialize)]
struct SensorReading {
    beacon_id: String,
    message_type: &'static str,
    temperature: f64,
    humidity: f64,
    battery_level: u8,
    signal_strength: i16,
    timestamp: String,
}

impl SensorReading {
    fn random(rng: &mut impl Rng, beacon_count: u32) -> Self {
        Self {
            beacon_id: format!("BEACON-{:03}", rng.gen_range(1..=beacon_count)),
            message_type: "sensor_reading",
            temperature: one_decimal(rng.gen_range(18.0..=28.0)),
            humidity: one_decimal(rng.gen_range(30.0..=70.0)),
            battery_level: rng.gen_range(60..=100),
            signal_strength: rng.gen_range(-80..=-40),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

struct Simulator {
    config: SimulatorConfig,
    client: Client,
}

impl Simulator {
    async fn check_health(&self) -> Result<bool, reqwest::Error> {
        let response = self.client.get(self.config.health_url()).send().await?;
        Ok(response.status() == StatusCode::OK)
    }

    async fn send_reading(&self) -> Result<(), reqwest::Error> {
        let reading = SensorReading::random(&mut rand::thread_rng(), self.config.beacon_count);
        let response = self
            .client
            .post(self.config.data_url())
            .json(&reading)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::CREATED {
            tracing::info!(
                beacon_id = %reading.beacon_id,
                temperature = reading.temperature,
                response = %body,
                "reading sent"
            );
        } else {
            tracing::warn!(status = status.as_u16(), body = %body, "relay rejected reading");
        }
        Ok(())
    }

    async fn run(&self) -> u64 {
        let mut sent = 0u64;
        let mut ticker = tokio::time::interval(self.config.send_interval);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    sent += 1;
                    tracing::debug!(message_number = sent, "sending reading");
                    if let Err(err) = self.send_reading().await {
                        if err.is_connect() {
                            tracing::error!(
                                relay_url = %self.config.relay_url,
                                "connection failed, is the relay running?"
                            );
                        } else {
                            tracing::error!(error = %err, "send failed");
                        }
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("stopped by user");
                    return sent;
                }
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = SimulatorConfig::from_env();
    let client = match Client::builder().timeout(config.request_timeout).build() {
        Ok(client) => client,
        Err(err) => {
            tracing::error!(error = %err, "failed to build http client");
            return;
        }
    };
    tracing::info!(
        url = %config.data_url(),
        interval_secs = config.send_interval.as_secs(),
        "beacon simulator starting, press Ctrl+C to stop"
    );

    let simulator = Simulator { config, client };
    match simulator.check_health().await {
        Ok(true) => tracing::info!("relay is healthy"),
        Ok(false) => tracing::warn!("relay returned unexpected health status"),
        Err(err) => {
            tracing::error!(error = %err, "cannot reach relay, start it first");
            return;
        }
    }

    let sent = simulator.run().await;
    tracing::info!(total = sent, "simulator stopped");
}
