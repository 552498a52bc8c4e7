//! HTTP surface: page routes, the live diagram, and the demo gate API.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::Router;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{Request, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use rusqlite::Connection;
use serde::Deserialize;
use tracing::{Instrument, info, info_span};

use crate::autoplay::HudDriver;
use crate::config::SiteConfig;
use crate::gate::{lead_handler, unlock_handler};
use crate::hud::{HudOptions, Scene};
use crate::pages;
use crate::plays::{Catalog, Play};
use crate::routing::host_routing;

const LIVE_REFRESH_MIN_MS: u64 = 33;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SiteConfig>,
    pub db: Arc<Mutex<Connection>>,
    pub hud: Arc<HudDriver>,
    pub catalog: Arc<Catalog>,
}

impl AppState {
    pub fn new(config: SiteConfig, db: Connection, catalog: Catalog) -> Self {
        let hud = HudDriver::spawn(catalog.len(), config.hud.timings);
        Self {
            config: Arc::new(config),
            db: Arc::new(Mutex::new(db)),
            hud: Arc::new(hud),
            catalog: Arc::new(catalog),
        }
    }

    fn hud_options(&self) -> HudOptions {
        HudOptions {
            show_play_card: self.config.hud.show_play_card,
            clamp_to_safe_area: self.config.hud.clamp_to_safe_area,
            ..HudOptions::default()
        }
    }

    /// Browser re-fetch cadence for the landing diagram: the repaint tick, floored.
    fn live_refresh_ms(&self) -> u64 {
        (self.config.hud.timings.frame.as_millis() as u64).max(LIVE_REFRESH_MIN_MS)
    }

    /// The play and phase the autoplay driver is showing right now.
    fn live_frame(&self) -> (&Play, f64) {
        let snap = self.hud.snapshot();
        (self.catalog.get(snap.index), snap.t)
    }
}

/// Builds the full app. Host routing wraps the inner router so that rewritten paths are
/// matched against the rewritten URI.
pub fn build_router(state: AppState) -> Router {
    let site = Router::new()
        .route("/", get(landing))
        .route("/gate", get(gate_page))
        .route("/privacy", get(privacy_page))
        .route("/hud.svg", get(hud_svg))
        .route("/healthz", get(healthz))
        .route("/api/demo/lead", post(lead_handler))
        .route("/api/demo/unlock", post(unlock_handler))
        .with_state(state.clone());

    Router::new()
        .fallback_service(site)
        .layer(middleware::from_fn_with_state(state, host_routing))
        .layer(middleware::from_fn(trace_requests))
}

async fn trace_requests(request: Request<Body>, next: Next) -> Response {
    let span = info_span!(
        "http.request",
        method = %request.method(),
        path = %request.uri().path()
    );
    async move {
        let started = Instant::now();
        let response = next.run(request).await;
        info!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request"
        );
        response
    }
    .instrument(span)
    .await
}

async fn landing(State(state): State<AppState>) -> Html<String> {
    let (play, t) = state.live_frame();
    let svg = Scene::compose(play, t, &state.hud_options()).to_svg();
    Html(pages::landing(&svg, &play.label, state.live_refresh_ms()))
}

async fn gate_page() -> Html<String> {
    Html(pages::gate())
}

async fn privacy_page() -> Html<String> {
    Html(pages::privacy())
}

#[derive(Debug, Default, Deserialize)]
pub struct HudQuery {
    pub play: Option<String>,
    pub t: Option<f64>,
}

async fn hud_svg(State(state): State<AppState>, Query(q): Query<HudQuery>) -> Response {
    let (live_play, live_t) = state.live_frame();
    let play = match q.play.as_deref() {
        Some(id) => match state.catalog.find(id) {
            Some(play) => play,
            None => return (StatusCode::NOT_FOUND, "Unknown play").into_response(),
        },
        None => live_play,
    };
    let t = q
        .t
        .filter(|t| t.is_finite())
        .map(|t| t.rem_euclid(1.0))
        .unwrap_or(live_t);
    let svg = Scene::compose(play, t, &state.hud_options()).to_svg();
    (
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        svg,
    )
        .into_response()
}

async fn healthz() -> &'static str {
    "ok"
}
