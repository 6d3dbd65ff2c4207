// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use relational_auth_gate::{
    api::router,
    config::{LogFormat, Settings, DEFAULT_LOG_FILTER},
    state::AppState,
};

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.pretty().init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    init_tracing(settings.log_format);

    info!("Starting Relational Auth Gate");

    if settings.firebase_project_id.is_none() {
        warn!("FIREBASE_PROJECT_ID is not set; protected routes will deny every request");
    }

    let state = AppState::from_settings(&settings).map_err(|e| {
        error!(error = %e, "Failed to initialize identity provider");
        e
    })?;
    let app = router(state);

    let addr = settings.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(%addr, "Auth gate listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
