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

use crate::alert::Alert;
use crate::banner::{Banner, BannerState};
use crate::context::AlertContext;
use crate::summary::{AlertCounts, AlertSummary};
use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::trace::TraceLayer;

const TEXT_FORMAT: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";
const DEFAULT_CLIENT: &str = "default";

/// State shared by all HTTP handlers.
///
/// Each dashboard client gets its own banner, picked by the `client` query
/// parameter, so a dismiss from one client doesn't hide the banner for others.
#[derive(Debug)]
pub struct RequestContext {
    registry: Registry,
    alerts: AlertContext,
    banners: Mutex<HashMap<String, Banner>>,
}

impl RequestContext {
    pub fn new(registry: Registry, alerts: AlertContext) -> Self {
        RequestContext {
            registry,
            alerts,
            banners: Mutex::new(HashMap::new()),
        }
    }

    fn banners(&self) -> MutexGuard<'_, HashMap<String, Banner>> {
        // Banners hold no invariant a panicking holder could break.
        self.banners.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn banner_state(&self, client: &str) -> BannerState {
        match self.banners().get(client) {
            Some(banner) => banner.state(),
            None => Banner::new(self.alerts.clone()).state(),
        }
    }

    fn dismiss_banner(&self, client: &str) -> BannerState {
        let mut banners = self.banners();
        // A banner whose dismiss was cleared by a newer list is the same as a new one.
        banners.retain(|_, b| b.is_dismissed());

        let banner = banners
            .entry(client.to_owned())
            .or_insert_with(|| Banner::new(self.alerts.clone()));
        banner.dismiss();
        banner.state()
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct BannerQuery {
    pub client: Option<String>,
}

impl BannerQuery {
    fn client(&self) -> &str {
        self.client.as_deref().unwrap_or(DEFAULT_CLIENT)
    }
}

#[derive(Serialize, Debug)]
pub struct SnapshotView {
    pub generation: u64,
    pub modal_open: bool,
    pub alerts: Vec<Alert>,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct ModalView {
    pub modal_open: bool,
    pub changed: bool,
}

pub fn app(context: Arc<RequestContext>) -> Router {
    Router::new()
        .route("/metrics", get(text_metrics))
        .route("/alerts", get(alerts))
        .route("/alerts/summary", get(summary))
        .route("/alerts/banner", get(banner))
        .route("/alerts/show", post(show))
        .route("/alerts/close", post(close))
        .route("/alerts/banner/dismiss", post(dismiss))
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

pub async fn text_metrics(State(context): State<Arc<RequestContext>>) -> Response {
    let mut buf = String::new();

    match encode(&mut buf, &context.registry) {
        Ok(_) => {
            tracing::debug!(message = "encoded prometheus metrics to text format", num_bytes = buf.len());
            (StatusCode::OK, [(CONTENT_TYPE, TEXT_FORMAT)], buf).into_response()
        }
        Err(e) => {
            tracing::error!(message = "error encoding metrics", error = %e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn alerts(State(context): State<Arc<RequestContext>>) -> Json<SnapshotView> {
    let snapshot = context.alerts.snapshot();
    Json(SnapshotView {
        generation: snapshot.generation,
        modal_open: snapshot.modal_open,
        alerts: snapshot.alerts.to_vec(),
    })
}

pub async fn summary(State(context): State<Arc<RequestContext>>) -> Json<AlertCounts> {
    let alerts = context.alerts.alerts();
    Json(AlertSummary::from_alerts(&alerts).counts())
}

pub async fn banner(
    State(context): State<Arc<RequestContext>>,
    Query(query): Query<BannerQuery>,
) -> Json<BannerState> {
    Json(context.banner_state(query.client()))
}

pub async fn show(State(context): State<Arc<RequestContext>>) -> Json<ModalView> {
    let changed = context.alerts.show_alerts();
    Json(ModalView {
        modal_open: context.alerts.is_modal_open(),
        changed,
    })
}

pub async fn close(State(context): State<Arc<RequestContext>>) -> Json<ModalView> {
    let changed = context.alerts.close_alerts();
    Json(ModalView {
        modal_open: context.alerts.is_modal_open(),
        changed,
    })
}

pub async fn dismiss(
    State(context): State<Arc<RequestContext>>,
    Query(query): Query<BannerQuery>,
) -> Json<BannerState> {
    Json(context.dismiss_banner(query.client()))
}
