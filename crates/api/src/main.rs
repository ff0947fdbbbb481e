mod config;
mod counters;
mod error;
mod handlers;
mod state;
mod stores;
#[cfg(test)]
mod test_utils;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use axum::{Router, http};
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::Config,
    counters::Counters,
    state::AppState,
    stores::{KvStore, RedisKvStore},
};

#[derive(Parser)]
#[command(name = "api")]
#[command(about = "Presence and catch report counter API")]
struct Args {
    /// Ping the backend, print its budget status, and exit
    #[arg(long)]
    check_backend: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider before any TLS operations
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let args = Args::parse();
    let config = envy::prefixed("ENGAGEMENT_").from_env::<Config>()?;

    // Sentry guard must stay alive for the whole process
    let _sentry_guard = config.sentry_dsn.as_ref().map(|dsn| {
        sentry::init((
            dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: Some(config.env.clone().into()),
                ..Default::default()
            },
        ))
    });

    // Set up tracing: JSON in production, human-readable otherwise
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.is_production() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .init();
    }

    let counters = Counters::new(open_store(&config), &config);

    if args.check_backend {
        let status = counters.check().await?;
        tracing::info!(
            reachable = status.reachable,
            within_budget = status.within_budget,
            "Backend check complete"
        );
        if !status.reachable {
            anyhow::bail!("backend did not answer PING");
        }
        return Ok(());
    }

    let state = AppState { counters };

    // Request ID header name
    let x_request_id = http::HeaderName::from_static("x-request-id");

    let app = Router::new()
        .nest("/health", handlers::health::router())
        .nest("/api/presence", handlers::presence::router())
        .nest("/api/catch-report", handlers::catch_report::router())
        .nest("/api/catch-report-ugc", handlers::catch_submission::router())
        .with_state(state)
        // Request ID: generate UUID, include in logs, return in response
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &http::Request<axum::body::Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            },
        ))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(16 * 1024)); // payloads are a few short strings

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");

    Ok(())
}

/// Build the backend store, or `None` to run with counters disabled.
fn open_store(config: &Config) -> Option<Arc<dyn KvStore>> {
    let Some(settings) = config.backend() else {
        tracing::info!("Backend not configured, counters will report defaults");
        return None;
    };

    match RedisKvStore::open(&settings) {
        Ok(store) => {
            tracing::info!(
                daily_budget = config.daily_budget,
                presence_window_secs = config.presence_window_secs,
                "Backend configured"
            );
            Some(Arc::new(store))
        }
        Err(err) => {
            tracing::warn!(error = %err, "Invalid backend URL, counters will report defaults");
            None
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
