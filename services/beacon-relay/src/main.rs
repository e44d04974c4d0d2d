use anyhow::Context;
use beacon_common::{bind_listener, init_tracing, shutdown_signal};
use beacon_relay::{app, config::RelayConfig, state::AppState, store::RestStore};
use std::{net::SocketAddr, sync::Arc};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guards = init_tracing("beacon-relay");

    // Store credentials are mandatory; refuse to start without them.
    let config = RelayConfig::from_env().map_err(|err| {
        tracing::error!(error = %err, "store credentials not configured");
        err
    })?;
    tracing::info!(port = config.port, store = ?config.store, "starting beacon relay");

    let store = RestStore::new(&config.store).context("build message store client")?;
    let state = AppState::new(Arc::new(store));

    let app = app::build_router(state);
    let listener = bind_listener(config.port)
        .await
        .with_context(|| format!("bind port {}", config.port))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("serve")?;

    tracing::info!("beacon relay stopped");
    Ok(())
}
