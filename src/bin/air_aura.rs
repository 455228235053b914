// air_aura - Alert aggregation service for the Air Aura dashboard
//
// Copyright 2022 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use air_aura::client::{load_fallback, AlertSourceClient};
use air_aura::context::AlertContext;
use air_aura::http::RequestContext;
use air_aura::metrics::AlertMetrics;
use air_aura::notifier::{AlertNotifier, DEFAULT_MODAL_DELAY};
use clap::Parser;
use prometheus_client::registry::Registry;
use reqwest::Client;
use std::error::Error;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{self, SignalKind};
use tracing::{Instrument, Level};

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 9783);
const DEFAULT_REFRESH_SECS: u64 = 60;
const DEFAULT_TIMEOUT_MILLIS: u64 = 5000;
const DEFAULT_API_URL: &str = "http://localhost:8000/api/";

#[derive(Debug, Parser)]
#[clap(name = "air_aura", version = clap::crate_version!())]
struct AirAuraApplication {
    /// Base URL for the Air Aura backend API
    #[clap(long, default_value_t = DEFAULT_API_URL.into())]
    api_url: String,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,

    /// Fetch alerts from the backend at this interval, in seconds. Must be at least 1.
    #[clap(long, default_value_t = DEFAULT_REFRESH_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    refresh_secs: u64,

    /// Timeout for fetching alerts from the backend, in milliseconds.
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_MILLIS)]
    timeout_millis: u64,

    /// Delay before a critical alert opens the alert modal, in milliseconds.
    #[clap(long, default_value_t = DEFAULT_MODAL_DELAY.as_millis() as u64)]
    modal_delay_millis: u64,

    /// JSON file with alerts to use if the backend can't be reached at startup
    #[clap(long)]
    fallback_file: Option<PathBuf>,

    /// Address to bind to. By default, air_aura will bind to public address since
    /// the dashboard and Prometheus both need to reach it.
    #[clap(long, default_value_t = DEFAULT_BIND_ADDR.into())]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let opts = AirAuraApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    let timeout = Duration::from_millis(opts.timeout_millis);
    let http_client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        tracing::error!(message = "unable to initialize HTTP client", error = %e);
        process::exit(1)
    });

    let client = AlertSourceClient::new(http_client, &opts.api_url).unwrap_or_else(|e| {
        tracing::error!(message = "unable to initialize alert client", error = %e);
        process::exit(1)
    });

    let alerts = AlertContext::new();
    let notifier = AlertNotifier::new(alerts.clone(), Duration::from_millis(opts.modal_delay_millis));
    let mut registry = Registry::default();
    let metrics = AlertMetrics::new(&mut registry, notifier.auto_open_counter());

    // Make an initial request so that the dashboard has something to show as soon as the
    // HTTP server starts. If the backend isn't available, fall back to the static alert
    // list when one was provided.
    match client.alerts().await {
        Ok(batch) => {
            metrics.fetch_succeeded();
            metrics.malformed(batch.malformed);
            tracing::info!(message = "fetched initial alerts", count = batch.alerts.len(), malformed = batch.malformed);
            alerts.replace_alerts(batch.alerts);
        }
        Err(e) => {
            metrics.fetch_failed();
            tracing::warn!(message = "failed to fetch initial alerts", error = %e);

            if let Some(path) = &opts.fallback_file {
                match load_fallback(path) {
                    Ok(batch) => {
                        metrics.malformed(batch.malformed);
                        tracing::info!(message = "using fallback alerts", path = %path.display(), count = batch.alerts.len());
                        alerts.replace_alerts(batch.alerts);
                    }
                    Err(e) => {
                        tracing::error!(message = "unable to load fallback alerts", path = %path.display(), error = %e);
                        process::exit(1)
                    }
                }
            }
        }
    }
    metrics.snapshot(&alerts.snapshot());

    tokio::spawn(notifier.run());

    let poll_alerts = alerts.clone();
    let mut interval = tokio::time::interval(Duration::from_secs(opts.refresh_secs));
    tokio::spawn(async move {
        tracing::info!(message = "alert polling started", url = %client.alerts_url());

        // The first tick completes immediately and the initial fetch was made above.
        let _ = interval.tick().await;
        loop {
            let _ = interval.tick().await;
            match client
                .alerts()
                .instrument(tracing::span!(Level::DEBUG, "air_aura_alerts"))
                .await
            {
                Ok(batch) => {
                    metrics.fetch_succeeded();
                    metrics.malformed(batch.malformed);
                    let count = batch.alerts.len();
                    if poll_alerts.update_alerts(batch.alerts) {
                        tracing::info!(message = "fetched new alerts", count = count);
                    } else {
                        tracing::debug!(message = "alerts unchanged", count = count);
                    }
                }
                Err(e) => {
                    metrics.fetch_failed();
                    tracing::error!(message = "failed to fetch alerts", error = %e);
                }
            }

            metrics.snapshot(&poll_alerts.snapshot());
        }
    });

    let context = Arc::new(RequestContext::new(registry, alerts));
    let server = axum::Server::try_bind(&opts.bind)
        .unwrap_or_else(|e| {
            tracing::error!(message = "error binding to address", address = %opts.bind, error = %e);
            process::exit(1)
        })
        .serve(air_aura::http::app(context).into_make_service());

    tracing::info!(message = "server started", address = %server.local_addr());
    server
        .with_graceful_shutdown(async {
            // Wait for either SIGTERM or SIGINT to shutdown
            tokio::select! {
                _ = sigterm() => {}
                _ = sigint() => {}
            }
        })
        .await?;

    tracing::info!("server shutdown");
    Ok(())
}

/// Return after the first SIGTERM signal received by this process
async fn sigterm() -> io::Result<()> {
    unix::signal(SignalKind::terminate())?.recv().await;
    Ok(())
}

/// Return after the first SIGINT signal received by this process
async fn sigint() -> io::Result<()> {
    unix::signal(SignalKind::interrupt())?.recv().await;
    Ok(())
}
